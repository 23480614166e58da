//! # Messaging Feature
//!
//! Outbound notification delivery to chats.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod telegram;

pub use telegram::{Messenger, TelegramMessenger};
