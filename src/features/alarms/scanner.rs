//! Due-alarm detection
//!
//! Matching is exact-minute: an alarm whose minute passes while the scheduler
//! is not ticking is never fired late.

use anyhow::Result;
use chrono::{DateTime, Datelike, TimeZone, Timelike};
use std::sync::Arc;

use crate::core::weekday_bit;
use crate::features::alarms::model::DueAlarm;
use crate::features::alarms::repository::AlarmRepository;

/// Local wall-clock components a scan matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanInstant {
    pub hour: u32,
    pub minute: u32,
    /// 1 = Monday .. 7 = Sunday
    pub weekday: u32,
}

impl ScanInstant {
    pub fn from_datetime<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        ScanInstant {
            hour: instant.hour(),
            minute: instant.minute(),
            weekday: instant.weekday().number_from_monday(),
        }
    }

    pub fn weekday_bit(&self) -> u8 {
        weekday_bit(self.weekday)
    }
}

#[derive(Clone)]
pub struct DueAlarmScanner {
    repository: Arc<dyn AlarmRepository>,
}

impl DueAlarmScanner {
    pub fn new(repository: Arc<dyn AlarmRepository>) -> Self {
        Self { repository }
    }

    /// Alarms due at `instant`, already resolved in the scheduler's time zone
    pub async fn scan<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> Result<Vec<DueAlarm>> {
        let at = ScanInstant::from_datetime(instant);
        self.scan_at(at).await
    }

    pub async fn scan_at(&self, at: ScanInstant) -> Result<Vec<DueAlarm>> {
        self.repository
            .find_due_alarms(at.hour, at.minute, at.weekday_bit())
            .await
    }
}
