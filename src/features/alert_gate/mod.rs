//! # Alert Gate Feature
//!
//! External "alert active" condition that defers alarm delivery.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod client;

pub use client::{AlertGate, HttpAlertGate};
