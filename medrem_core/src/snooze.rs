//! Volatile snooze layer.
//!
//! A process-lifetime map of per-(medication, time) suppressions.
//! Deliberately not backed by the durable store: snoozing is
//! best-effort UX smoothing with overwrite-always semantics, distinct
//! from the intake log's insert-once semantics, and losing it on
//! restart is acceptable because the suppression window is short.

use crate::DoseKey;
use chrono::{DateTime, NaiveTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Default suppression window, in minutes
pub const DEFAULT_SNOOZE_MINUTES: i64 = 5;

/// Concurrency-safe in-memory store of active snoozes.
///
/// Shared between status readers and snooze writers; last completed
/// write wins. Expired entries are dropped on lookup, so no periodic
/// sweep is needed.
#[derive(Debug, Default)]
pub struct SnoozeStore {
    entries: Mutex<HashMap<DoseKey, DateTime<Utc>>>,
}

impl SnoozeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a suppression until `until`, overwriting any prior entry
    /// for the same dose slot. Repeated snoozing keeps pushing the
    /// window forward.
    pub fn set(&self, medication: &str, time: NaiveTime, until: DateTime<Utc>) {
        let mut entries = self.lock();
        entries.insert((medication.to_string(), time), until);
        tracing::debug!(medication, %time, %until, "snooze set");
    }

    /// The live suppression deadline for a dose slot, if any.
    ///
    /// An entry at or before `now` is expired: it is removed and `None`
    /// is returned.
    pub fn active_until(
        &self,
        medication: &str,
        time: NaiveTime,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let key = (medication.to_string(), time);
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(&until) if until > now => Some(until),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<DoseKey, DateTime<Utc>>> {
        // A poisoned lock only means another writer panicked; the map
        // itself is still a usable set of deadlines.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
