//! The reminder engine: the operations exposed to the boundary layer.
//!
//! Glues the configuration source, the durable intake log, and the
//! volatile snooze store together. Every operation re-reads the
//! schedule (no process-wide cache), validates its input against the
//! freshly loaded rule set, and delegates the actual work to the
//! classifier or the stores.

use crate::{
    status, ConfirmOutcome, Error, IntakeLog, IntakeRecord, MedicationRule, Result,
    ScheduleSnapshot, ScheduleSource, SnoozeStore, StatusReport, DEFAULT_SNOOZE_MINUTES,
};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// Longest accepted snooze, in minutes
pub const MAX_SNOOZE_MINUTES: i64 = 180;

/// Options for status computation
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusOptions {
    /// When the intake log is unreadable, treat every dose as
    /// not-yet-confirmed instead of failing. The report is marked
    /// `degraded` so the caller can tell.
    pub degraded: bool,
}

/// Result of a confirm operation
#[derive(Clone, Debug, Serialize)]
pub struct ConfirmReceipt {
    pub outcome: ConfirmOutcome,
    pub medication: String,
    #[serde(with = "crate::types::hhmm")]
    pub time: NaiveTime,
    /// Set when a record was created; `None` on a duplicate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Result of a snooze operation
#[derive(Clone, Debug, Serialize)]
pub struct SnoozeReceipt {
    pub medication: String,
    #[serde(with = "crate::types::hhmm")]
    pub time: NaiveTime,
    pub snoozed_until: DateTime<Utc>,
}

/// The medication schedule and acknowledgment engine.
///
/// Safe for unrestricted concurrent use: status computation is
/// read-only, snooze synchronizes through [`SnoozeStore`], and confirm
/// relies on the log's atomic check-then-insert.
pub struct ReminderEngine<S: ScheduleSource, L: IntakeLog> {
    schedule: S,
    log: L,
    snoozes: SnoozeStore,
}

impl<S: ScheduleSource, L: IntakeLog> ReminderEngine<S, L> {
    pub fn new(schedule: S, log: L) -> Self {
        Self {
            schedule,
            log,
            snoozes: SnoozeStore::new(),
        }
    }

    /// The configuration source, for boundary layers that also manage
    /// the schedule document
    pub fn schedule(&self) -> &S {
        &self.schedule
    }

    /// Classify all of today's dose instances at `now`
    pub fn status(&self, now: DateTime<Utc>) -> Result<StatusReport> {
        self.status_with(now, StatusOptions::default())
    }

    /// Classify with explicit options (degraded-mode opt-in)
    pub fn status_with(&self, now: DateTime<Utc>, options: StatusOptions) -> Result<StatusReport> {
        let snapshot = self.schedule.load()?;
        let today = now.with_timezone(&snapshot.settings.timezone).date_naive();

        let (acknowledged, degraded) = match self.log.acknowledged_on(today) {
            Ok(keys) => (keys, false),
            Err(err) if options.degraded && err.is_storage() => {
                tracing::warn!("intake log unreadable, serving degraded status: {err}");
                (HashSet::new(), true)
            }
            Err(err) => return Err(err),
        };

        let mut report = status::classify(&snapshot, &acknowledged, &self.snoozes, now);
        report.degraded = degraded;
        Ok(report)
    }

    /// Record a confirmed intake for (medication, time) on the calendar
    /// date of `at`. Idempotent per day: the first call creates, every
    /// later call reports a duplicate.
    pub fn confirm(&self, medication: &str, time: &str, at: DateTime<Utc>) -> Result<ConfirmReceipt> {
        let snapshot = self.schedule.load()?;
        let (rule, slot) = validate_dose(&snapshot, medication, time)?;

        let record = IntakeRecord {
            id: Uuid::new_v4(),
            medication: rule.name.clone(),
            scheduled_time: slot,
            date: at.with_timezone(&snapshot.settings.timezone).date_naive(),
            confirmed_at: at,
        };

        let outcome = self.log.append_unique(&record)?;
        match outcome {
            ConfirmOutcome::Created => {
                tracing::info!(medication = %record.medication, time = %slot, "intake confirmed");
            }
            ConfirmOutcome::Duplicate => {
                tracing::info!(medication = %record.medication, time = %slot, "intake already confirmed today");
            }
        }

        Ok(ConfirmReceipt {
            outcome,
            medication: record.medication,
            time: slot,
            confirmed_at: matches!(outcome, ConfirmOutcome::Created).then_some(at),
        })
    }

    /// Suppress reminders for (medication, time) until `at + minutes`.
    ///
    /// Always accepted, never a duplicate: repeated snoozing keeps
    /// pushing the window forward. Touches only the volatile store.
    pub fn snooze(
        &self,
        medication: &str,
        time: &str,
        at: DateTime<Utc>,
        minutes: Option<i64>,
    ) -> Result<SnoozeReceipt> {
        let snapshot = self.schedule.load()?;
        let (rule, slot) = validate_dose(&snapshot, medication, time)?;

        let minutes = minutes.unwrap_or(DEFAULT_SNOOZE_MINUTES);
        if !(1..=MAX_SNOOZE_MINUTES).contains(&minutes) {
            return Err(Error::validation(
                "minutes",
                format!("snooze duration must be 1..={MAX_SNOOZE_MINUTES} minutes, got {minutes}"),
            ));
        }

        let until = at + Duration::minutes(minutes);
        self.snoozes.set(&rule.name, slot, until);
        tracing::info!(medication = %rule.name, time = %slot, %until, "dose snoozed");

        Ok(SnoozeReceipt {
            medication: rule.name.clone(),
            time: slot,
            snoozed_until: until,
        })
    }

    /// Confirmed intakes from the last `days` days, most recent first
    pub fn history(&self, now: DateTime<Utc>, days: i64) -> Result<Vec<IntakeRecord>> {
        self.log.recent(now - Duration::days(days))
    }
}

/// Check a confirm/snooze target against the configured rule set.
///
/// Rejects unknown medication names, malformed times, and times that
/// are not a configured slot of the named rule - all before any
/// durable state is touched.
fn validate_dose<'a>(
    snapshot: &'a ScheduleSnapshot,
    medication: &str,
    time: &str,
) -> Result<(&'a MedicationRule, NaiveTime)> {
    if medication.trim().is_empty() {
        return Err(Error::validation("medication", "name must not be empty"));
    }
    if medication.len() > crate::MAX_NAME_LEN {
        return Err(Error::validation(
            "medication",
            format!("name longer than {} characters", crate::MAX_NAME_LEN),
        ));
    }
    let rule = snapshot.rule(medication).ok_or_else(|| {
        Error::validation("medication", format!("unknown medication {medication:?}"))
    })?;

    let slot = crate::parse_hhmm(time)
        .ok_or_else(|| Error::validation("time", format!("invalid time {time:?} (use HH:MM)")))?;
    if !rule.times.contains(&slot) {
        return Err(Error::validation(
            "time",
            format!("{time} is not a scheduled time for {medication:?}"),
        ));
    }

    Ok((rule, slot))
}
