//! Core domain types for the medication reminder engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Medication rules and settings (the parsed schedule)
//! - Intake records (durable acknowledgments)
//! - Dose items and status reports (classifier output)
//! - Confirmation outcomes

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a medication name (the log/lookup key)
pub const MAX_NAME_LEN: usize = 100;

// ============================================================================
// Schedule Types
// ============================================================================

/// One configured medication with its recurrence and time rules.
///
/// Produced by schedule validation; `times` keeps configuration order
/// and is guaranteed duplicate-free, `days` is the canonical weekday
/// set (empty = every day).
#[derive(Clone, Debug, PartialEq)]
pub struct MedicationRule {
    pub name: String,
    pub display_text: Option<String>,
    pub times: Vec<NaiveTime>,
    pub days: Vec<Weekday>,
    pub enabled: bool,
}

/// Operator-tunable settings governing status computation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    /// Symmetric tolerance band around a scheduled time, in minutes
    pub reminder_window: i64,
    /// IANA zone used for all "now" computations
    pub timezone: Tz,
}

/// Immutable per-request view of the configured schedule.
///
/// Re-read from the configuration source on every operation, so
/// operator edits take effect without a restart.
#[derive(Clone, Debug)]
pub struct ScheduleSnapshot {
    pub medications: Vec<MedicationRule>,
    pub settings: Settings,
}

impl ScheduleSnapshot {
    /// Look up a rule by its name (the unique key within a configuration)
    pub fn rule(&self, name: &str) -> Option<&MedicationRule> {
        self.medications.iter().find(|m| m.name == name)
    }
}

// ============================================================================
// Intake Log Types
// ============================================================================

/// Identity of one dose slot: (medication name, scheduled time).
///
/// Scoped to a calendar date by the lookup it is used in.
pub type DoseKey = (String, NaiveTime);

/// A durable confirmation: one medication taken for one scheduled slot
/// on one calendar date. Append-only; never mutated by the engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntakeRecord {
    pub id: Uuid,
    pub medication: String,
    #[serde(with = "hhmm")]
    pub scheduled_time: NaiveTime,
    pub date: NaiveDate,
    pub confirmed_at: DateTime<Utc>,
}

impl IntakeRecord {
    pub fn key(&self) -> DoseKey {
        (self.medication.clone(), self.scheduled_time)
    }
}

/// Result of a confirmation attempt.
///
/// `Duplicate` is a normal outcome, not an error: confirmation is
/// idempotent per calendar day and retried clients are not penalized.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmOutcome {
    Created,
    Duplicate,
}

// ============================================================================
// Status Types
// ============================================================================

/// One classified dose instance as presented to the caller
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DoseItem {
    pub medication: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    /// The configured slot this instance belongs to
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// Scheduled instant in the configured zone
    pub scheduled: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_until: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_late: Option<i64>,
    /// Set when a live snooze redirected this instance to `upcoming`;
    /// the instant the suppression ends (the displayed reminder time)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snoozed_until: Option<DateTime<FixedOffset>>,
}

/// The partitioned dose lists for one instant in time.
///
/// Every scheduled, enabled, un-acknowledged dose instance for "today"
/// appears in exactly one of the three lists.
#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    pub overdue: Vec<DoseItem>,
    pub due: Vec<DoseItem>,
    pub upcoming: Vec<DoseItem>,
    pub generated_at: DateTime<FixedOffset>,
    /// True when the intake log was unreadable and the caller opted
    /// into the treat-as-unconfirmed fallback
    pub degraded: bool,
}

// ============================================================================
// Time helpers
// ============================================================================

/// Parse a wall-clock time in strict `HH:MM` form
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

/// Serde adapter serializing a [`NaiveTime`] as `HH:MM`
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(de)?;
        super::parse_hhmm(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid HH:MM time: {s:?}")))
    }
}
