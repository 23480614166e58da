//! # Features Layer
//!
//! - **alarms**: due-alarm scanning, gated delivery, per-minute scheduler
//! - **alert_gate**: external alert status polled before delivery
//! - **messaging**: outbound chat notifications

pub mod alarms;
pub mod alert_gate;
pub mod messaging;

pub use alarms::{
    AlarmRepository, AlarmScheduler, DeliverySequencer, DueAlarmScanner, PendingDeliveries,
    SchedulerHandle,
};
pub use alert_gate::{AlertGate, HttpAlertGate};
pub use messaging::{Messenger, TelegramMessenger};
