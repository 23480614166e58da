// Core layer - shared types and configuration
pub mod core;

// Features layer - scheduling, alert gate, messaging
pub mod features;

// Infrastructure
pub mod database;

// Application layer
pub mod commands;

pub use core::Config;
pub use database::Database;

pub use features::{
    // Alarms
    AlarmRepository, AlarmScheduler, DeliverySequencer, DueAlarmScanner, PendingDeliveries,
    SchedulerHandle,
    // Alert gate
    AlertGate, HttpAlertGate,
    // Messaging
    Messenger, TelegramMessenger,
};
