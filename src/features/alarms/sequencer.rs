//! # Delivery Sequencer
//!
//! One instance per dispatched [`DueAlarm`]. Walks
//! `AwaitingGate -> Firing -> Completed`:
//!
//! - **AwaitingGate** polls the [`AlertGate`] and sleeps [`GATE_BACKOFF`] between
//!   polls for as long as an alert is active. A failed poll counts as active.
//! - **Firing** schedules every repeat up front as its own one-shot timer task,
//!   repeat `i` at `(i - 1) * interval` after entering the state.
//! - **Completed** removes the sequence from [`PendingDeliveries`]. Repeats that
//!   are scheduled but not yet sent keep running on their own.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Gate failures fail closed instead of aborting the sequence
//! - 1.0.0: Initial release

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};

use crate::features::alarms::model::DueAlarm;
use crate::features::alarms::pending::PendingDeliveries;
use crate::features::alert_gate::AlertGate;
use crate::features::messaging::Messenger;

/// Wait between gate polls while an alert is active
pub const GATE_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    AwaitingGate,
    Firing,
    Completed,
}

impl std::fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryState::AwaitingGate => write!(f, "awaiting_gate"),
            DeliveryState::Firing => write!(f, "firing"),
            DeliveryState::Completed => write!(f, "completed"),
        }
    }
}

/// Delay of a 1-indexed repeat from the moment firing starts
pub fn repeat_offset(repeat: u32, interval_secs: u32) -> Duration {
    Duration::from_secs(u64::from(repeat.saturating_sub(1)) * u64::from(interval_secs))
}

pub struct DeliverySequencer {
    due: DueAlarm,
    gate: Arc<dyn AlertGate>,
    messenger: Arc<dyn Messenger>,
    pending: PendingDeliveries,
    backoff: Duration,
}

impl DeliverySequencer {
    pub fn new(
        due: DueAlarm,
        gate: Arc<dyn AlertGate>,
        messenger: Arc<dyn Messenger>,
        pending: PendingDeliveries,
    ) -> Self {
        Self {
            due,
            gate,
            messenger,
            pending,
            backoff: GATE_BACKOFF,
        }
    }

    /// Drive the sequence to completion. Returns the repeat timer tasks, which
    /// may still be pending when this returns.
    pub async fn run(self) -> Vec<JoinHandle<()>> {
        let key = self.due.key();
        let mut timers = Vec::new();
        let mut state = DeliveryState::AwaitingGate;

        loop {
            debug!("Delivery {key} entering {state}");
            state = match state {
                DeliveryState::AwaitingGate => {
                    let polls = self.wait_for_gate().await;
                    debug!("Delivery {key} gate clear after {polls} poll(s)");
                    DeliveryState::Firing
                }
                DeliveryState::Firing => {
                    timers = self.schedule_repeats();
                    DeliveryState::Completed
                }
                DeliveryState::Completed => {
                    self.pending.complete(&key);
                    break;
                }
            };
        }

        timers
    }

    /// Poll until the gate reports inactive. Returns the number of polls made.
    async fn wait_for_gate(&self) -> u32 {
        let key = self.due.key();
        let mut polls = 0;

        loop {
            polls += 1;
            match self.gate.is_active().await {
                Ok(false) => return polls,
                Ok(true) => {
                    info!("Alert active, holding alarm {key} for {}s", self.backoff.as_secs());
                }
                Err(e) => {
                    warn!("Alert status check failed for alarm {key}, treating as active: {e:#}");
                }
            }
            sleep(self.backoff).await;
        }
    }

    fn schedule_repeats(&self) -> Vec<JoinHandle<()>> {
        let started = Instant::now();
        let key = self.due.key();
        info!(
            "Firing alarm {key}: {} repeat(s) every {}s",
            self.due.repeats, self.due.interval_secs
        );

        (1..=self.due.repeats)
            .map(|repeat| {
                let deadline = started + repeat_offset(repeat, self.due.interval_secs);
                let messenger = Arc::clone(&self.messenger);
                let chat_id = self.due.chat_id;
                let text = self.due.notification_text(repeat);

                tokio::spawn(async move {
                    sleep_until(deadline).await;
                    if let Err(e) = messenger.notify(chat_id, &text).await {
                        warn!("Failed to deliver repeat #{repeat} of alarm {key}: {e:#}");
                    }
                })
            })
            .collect()
    }
}
