//! Recurrence evaluation: is a medication scheduled on a given date?
//!
//! The only recurrence grammar is weekly weekday sets. Token parsing
//! happens at schedule load time (see [`crate::weekday`]); by the time
//! a rule reaches this module its day set is canonical, so evaluation
//! cannot fail.

use crate::MedicationRule;
use chrono::{Datelike, NaiveDate};

/// True if the rule produces dose instances on `date`.
///
/// An empty day set means every day.
pub fn is_scheduled_on(rule: &MedicationRule, date: NaiveDate) -> bool {
    rule.days.is_empty() || rule.days.contains(&date.weekday())
}
