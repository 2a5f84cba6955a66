//! Status classification: the central algorithm.
//!
//! For one instant in time, partitions today's dose instances into
//! overdue / due / upcoming by combining the schedule snapshot, the
//! acknowledgment set, and the snooze layer. Pure given its inputs -
//! no side effects, nothing cached, recomputed on every query.

use crate::{
    recurrence, DoseItem, DoseKey, ScheduleSnapshot, SnoozeStore, StatusReport,
};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;

/// Classify every scheduled dose instance for the calendar date of
/// `now` under the configured timezone.
///
/// Per enabled rule scheduled today, per configured time:
/// - an acknowledged instance is excluded entirely (terminal for the
///   day);
/// - a live snooze redirects the instance to `upcoming`, displayed at
///   its suppress-until instant, so snoozing visibly delays the next
///   nag without erasing the dose from view;
/// - otherwise the signed distance from the scheduled instant is
///   compared against the reminder window: earlier than the window is
///   upcoming, inside the band is due, past it is overdue.
///
/// Lists are ordered by scheduled time, then medication name.
pub fn classify(
    snapshot: &ScheduleSnapshot,
    acknowledged: &HashSet<DoseKey>,
    snoozes: &SnoozeStore,
    now: DateTime<Utc>,
) -> StatusReport {
    let tz = snapshot.settings.timezone;
    let window = snapshot.settings.reminder_window;
    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();

    let mut overdue = Vec::new();
    let mut due = Vec::new();
    let mut upcoming = Vec::new();

    for rule in &snapshot.medications {
        if !rule.enabled || !recurrence::is_scheduled_on(rule, today) {
            continue;
        }

        for &time in &rule.times {
            if acknowledged.contains(&(rule.name.clone(), time)) {
                continue;
            }

            let scheduled = localize(tz, today, time);
            let delta = (now - scheduled.with_timezone(&Utc)).num_minutes();

            let mut item = DoseItem {
                medication: rule.name.clone(),
                display_text: rule.display_text.clone(),
                time,
                scheduled: scheduled.fixed_offset(),
                minutes_until: None,
                minutes_late: None,
                snoozed_until: None,
            };

            if let Some(until) = snoozes.active_until(&rule.name, time, now) {
                item.snoozed_until = Some(until.with_timezone(&tz).fixed_offset());
                item.minutes_until = Some((until - now).num_minutes().max(0));
                upcoming.push(item);
            } else if delta < -window {
                item.minutes_until = Some(-delta);
                upcoming.push(item);
            } else if delta <= window {
                item.minutes_late = Some(delta.max(0));
                due.push(item);
            } else {
                item.minutes_late = Some(delta);
                overdue.push(item);
            }
        }
    }

    for list in [&mut overdue, &mut due, &mut upcoming] {
        list.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.medication.cmp(&b.medication)));
    }

    StatusReport {
        overdue,
        due,
        upcoming,
        generated_at: local_now.fixed_offset(),
        degraded: false,
    }
}

/// Resolve a wall-clock slot to an instant in `tz`.
///
/// On a DST fall-back the earlier of the two candidates is taken; on a
/// spring-forward gap the slot is shifted one hour later.
fn localize(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(&shifted))
        }
    }
}
