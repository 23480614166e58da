//! Alarm domain types
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Added DeliveryKey for in-flight dedup
//! - 1.0.0: Initial release

use anyhow::{bail, Result};
use std::fmt;

use crate::core::{format_hhmm, ALL_DAYS_MASK};

/// A chat user known to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub tg_user_id: i64,
    /// Chat where alarm notifications are delivered
    pub tg_chat_id: i64,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
}

/// A stored recurring alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub id: i64,
    pub user_id: i64,
    pub label: String,
    pub hour: u32,
    pub minute: u32,
    pub days_mask: u8,
    pub enabled: bool,
    pub repeats: u32,
    /// Seconds between repeats
    pub interval_secs: u32,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

/// Validated payload for inserting an alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlarm {
    pub user_id: i64,
    pub label: String,
    pub hour: u32,
    pub minute: u32,
    pub days_mask: u8,
    pub repeats: u32,
    pub interval_secs: u32,
}

impl NewAlarm {
    pub fn new(
        user_id: i64,
        hour: u32,
        minute: u32,
        days_mask: u8,
        repeats: u32,
        interval_secs: u32,
    ) -> Result<Self> {
        if hour > 23 {
            bail!("Hour must be within 0-23, got {hour}");
        }
        if minute > 59 {
            bail!("Minute must be within 0-59, got {minute}");
        }
        if days_mask == 0 || days_mask > ALL_DAYS_MASK {
            bail!("Days mask must select at least one weekday, got {days_mask}");
        }
        if repeats == 0 {
            bail!("Repeats must be at least 1");
        }
        if interval_secs == 0 {
            bail!("Interval must be at least 1 second");
        }

        Ok(NewAlarm {
            user_id,
            label: default_label(hour, minute),
            hour,
            minute,
            days_mask,
            repeats,
            interval_secs,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

pub fn default_label(hour: u32, minute: u32) -> String {
    format!("Будильник {}", format_hhmm(hour, minute))
}

/// An enabled alarm matched by a scan, with its delivery destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueAlarm {
    pub alarm_id: i64,
    pub label: String,
    pub repeats: u32,
    pub interval_secs: u32,
    pub chat_id: i64,
}

impl DueAlarm {
    pub fn key(&self) -> DeliveryKey {
        DeliveryKey {
            alarm_id: self.alarm_id,
            chat_id: self.chat_id,
        }
    }

    /// Message text for the given 1-indexed repeat
    pub fn notification_text(&self, repeat: u32) -> String {
        format!("⏰ #{repeat} {}", self.label)
    }
}

/// Identifies one in-flight delivery sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeliveryKey {
    pub alarm_id: i64,
    pub chat_id: i64,
}

impl fmt::Display for DeliveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.alarm_id, self.chat_id)
    }
}
