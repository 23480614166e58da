//! Per-user alarm drafts collected across inline keyboard steps
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Moved from a process-wide map into DraftStore owned by BotContext
//! - 1.0.0: Initial release

use anyhow::{anyhow, Result};
use dashmap::DashMap;
use std::collections::BTreeSet;

use crate::core::{days_to_mask, mask_to_days};
use crate::features::alarms::NewAlarm;

pub const DEFAULT_REPEATS: u32 = 3;
pub const DEFAULT_INTERVAL_SECS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmDraft {
    pub hour: u32,
    pub minute: Option<u32>,
    /// Selected weekdays, 1 = Monday
    pub days: BTreeSet<u32>,
    pub repeats: u32,
    pub interval_secs: u32,
}

impl AlarmDraft {
    pub fn new(hour: u32) -> Self {
        Self {
            hour,
            minute: None,
            days: BTreeSet::new(),
            repeats: DEFAULT_REPEATS,
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }

    pub fn toggle_day(&mut self, day: u32) {
        if !(1..=7).contains(&day) {
            return;
        }
        if !self.days.remove(&day) {
            self.days.insert(day);
        }
    }

    pub fn days_mask(&self) -> u8 {
        let days: Vec<u32> = self.days.iter().copied().collect();
        days_to_mask(&days)
    }

    pub fn day_names(&self) -> Vec<&'static str> {
        mask_to_days(self.days_mask())
    }

    pub fn finalize(&self, user_id: i64) -> Result<NewAlarm> {
        let minute = self
            .minute
            .ok_or_else(|| anyhow!("Draft has no minute selected"))?;
        NewAlarm::new(
            user_id,
            self.hour,
            minute,
            self.days_mask(),
            self.repeats,
            self.interval_secs,
        )
    }
}

/// In-progress drafts keyed by Telegram user id
#[derive(Default)]
pub struct DraftStore {
    drafts: DashMap<i64, AlarmDraft>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh draft, discarding any previous one
    pub fn start(&self, user_id: i64, hour: u32) -> AlarmDraft {
        let draft = AlarmDraft::new(hour);
        self.drafts.insert(user_id, draft.clone());
        draft
    }

    /// Fix the time. Days and repeat settings restart from defaults.
    pub fn set_time(&self, user_id: i64, hour: u32, minute: u32) -> AlarmDraft {
        let mut draft = AlarmDraft::new(hour);
        draft.minute = Some(minute);
        self.drafts.insert(user_id, draft.clone());
        draft
    }

    /// Apply `change` to an existing draft and return the result
    pub fn update<F>(&self, user_id: i64, change: F) -> Option<AlarmDraft>
    where
        F: FnOnce(&mut AlarmDraft),
    {
        let mut draft = self.drafts.get_mut(&user_id)?;
        change(&mut draft);
        Some(draft.clone())
    }

    pub fn get(&self, user_id: i64) -> Option<AlarmDraft> {
        self.drafts.get(&user_id).map(|d| d.clone())
    }

    pub fn remove(&self, user_id: i64) -> Option<AlarmDraft> {
        self.drafts.remove(&user_id).map(|(_, d)| d)
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}
