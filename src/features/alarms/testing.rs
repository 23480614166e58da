//! Fake collaborators shared by the alarm tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::features::alert_gate::AlertGate;
use crate::features::alarms::model::DueAlarm;
use crate::features::alarms::repository::AlarmRepository;
use crate::features::messaging::Messenger;

/// Gate answering from a script; the last answer repeats once the script runs out
pub struct ScriptedGate {
    answers: Mutex<VecDeque<Result<bool, String>>>,
    fallback: bool,
    polls: AtomicUsize,
}

impl ScriptedGate {
    pub fn new(answers: Vec<Result<bool, String>>, fallback: bool) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            fallback,
            polls: AtomicUsize::new(0),
        }
    }

    pub fn always(active: bool) -> Self {
        Self::new(Vec::new(), active)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertGate for ScriptedGate {
    async fn is_active(&self) -> Result<bool> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = self.answers.lock().unwrap().pop_front();
        match next {
            Some(Ok(active)) => Ok(active),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(self.fallback),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub chat_id: i64,
    pub text: String,
    pub at: Instant,
}

/// Messenger that records every send, optionally slow or failing
#[derive(Default)]
pub struct RecordingMessenger {
    deliveries: Mutex<Vec<Delivery>>,
    delay: Duration,
    fail_texts: Vec<String>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each send takes `delay` to complete; the start time is what gets recorded
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing_on(texts: &[&str]) -> Self {
        Self {
            fail_texts: texts.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn notify(&self, chat_id: i64, text: &str) -> Result<()> {
        self.deliveries.lock().unwrap().push(Delivery {
            chat_id,
            text: text.to_string(),
            at: Instant::now(),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_texts.iter().any(|t| t == text) {
            return Err(anyhow!("chat unavailable"));
        }
        Ok(())
    }
}

/// Repository returning a fixed set of matches for every query
pub struct StaticRepository {
    due: Vec<DueAlarm>,
    fail: bool,
    queries: Mutex<Vec<(u32, u32, u8)>>,
}

impl StaticRepository {
    pub fn new(due: Vec<DueAlarm>) -> Self {
        Self {
            due,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            due: Vec::new(),
            fail: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(u32, u32, u8)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlarmRepository for StaticRepository {
    async fn find_due_alarms(&self, hour: u32, minute: u32, weekday_bit: u8) -> Result<Vec<DueAlarm>> {
        self.queries.lock().unwrap().push((hour, minute, weekday_bit));
        if self.fail {
            return Err(anyhow!("database is locked"));
        }
        Ok(self.due.clone())
    }
}

pub fn due_alarm(alarm_id: i64, chat_id: i64, repeats: u32, interval_secs: u32) -> DueAlarm {
    DueAlarm {
        alarm_id,
        label: format!("Будильник {alarm_id}"),
        repeats,
        interval_secs,
        chat_id,
    }
}
