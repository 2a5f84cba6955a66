#![forbid(unsafe_code)]

//! Core domain model and business logic for the medication reminder
//! system.
//!
//! This crate provides:
//! - Schedule model and configuration source (TOML document)
//! - Recurrence evaluation (weekly weekday sets, DE/EN tokens)
//! - The volatile snooze layer
//! - The durable intake log (locked JSONL, insert-once per dose/day)
//! - Status classification (overdue / due / upcoming)
//! - The confirmation and snooze handlers

pub mod types;
pub mod error;
pub mod logging;
pub mod weekday;
pub mod schedule;
pub mod recurrence;
pub mod snooze;
pub mod intake;
pub mod status;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use schedule::{ScheduleDocument, ScheduleSource, TomlScheduleSource, DEFAULT_REMINDER_WINDOW};
pub use snooze::{SnoozeStore, DEFAULT_SNOOZE_MINUTES};
pub use intake::{IntakeLog, JsonlIntakeLog};
pub use status::classify;
pub use engine::{
    ConfirmReceipt, ReminderEngine, SnoozeReceipt, StatusOptions, MAX_SNOOZE_MINUTES,
};
