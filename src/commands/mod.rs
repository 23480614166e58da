//! # Command System
//!
//! Telegram commands and the inline keyboard flow for creating, listing and
//! removing alarms.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Telegram front-end with per-user alarm drafts
//! - 2.1.0: Add modular handler infrastructure (handler, context)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod callbacks;
pub mod context;
pub mod drafts;
pub mod handler;
pub mod views;

pub use callbacks::{apply_action, handle_callback, CallbackAction, CallbackOutcome};
pub use context::BotContext;
pub use drafts::{AlarmDraft, DraftStore};
pub use handler::{handle_command, run_dispatcher, Command};
