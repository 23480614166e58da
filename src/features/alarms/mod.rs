//! # Alarms Feature
//!
//! Recurring weekday alarms: due-alarm scanning, gated delivery with timed
//! repeats, and the per-minute scheduler that ties them together.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod model;
pub mod pending;
pub mod repository;
pub mod scanner;
pub mod scheduler;
pub mod sequencer;

#[cfg(test)]
pub(crate) mod testing;

pub use model::{Alarm, DeliveryKey, DueAlarm, NewAlarm, User};
pub use pending::PendingDeliveries;
pub use repository::AlarmRepository;
pub use scanner::{DueAlarmScanner, ScanInstant};
pub use scheduler::{AlarmScheduler, SchedulerHandle};
pub use sequencer::{DeliverySequencer, DeliveryState, GATE_BACKOFF};
