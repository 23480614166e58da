//! # Core Module
//!
//! Configuration and the weekday-mask conventions shared by storage, the
//! scheduler and the chat front-end.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add days module with mask helpers
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod days;

// Re-export commonly used items
pub use config::Config;
pub use days::{
    day_index_from_name, days_to_mask, format_hhmm, mask_matches, mask_to_days, weekday_bit,
    ALL_DAYS_MASK, DAY_NAMES,
};
