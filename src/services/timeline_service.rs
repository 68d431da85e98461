//! Scheduling conflicts on the day timeline.
//!
//! Pairwise scan per day. Days rarely hold more than a handful of activities,
//! so the quadratic pass is fine; a sort-and-sweep would be the next step if
//! that ever changes.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::timeline::{ConflictType, ScheduledActivity, TimeConflict, TimeWindow};

/// Every overlapping pair of activities on the same day, sorted by date,
/// window start and ids. Input order does not affect the result.
pub fn detect_conflicts(activities: &[ScheduledActivity]) -> Vec<TimeConflict> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&ScheduledActivity>> = BTreeMap::new();
    for activity in activities {
        by_day.entry(activity.date).or_default().push(activity);
    }

    let mut conflicts = Vec::new();
    for (date, day) in by_day {
        for (i, a) in day.iter().enumerate() {
            for b in &day[i + 1..] {
                if overlaps(a, b) {
                    conflicts.push(conflict(date, a, b));
                }
            }
        }
    }

    conflicts.sort_by(|x, y| {
        x.date
            .cmp(&y.date)
            .then(x.window.start_minute.cmp(&y.window.start_minute))
            .then(x.activity_ids.cmp(&y.activity_ids))
    });
    conflicts
}

/// Half-open intervals `[start, start + duration)`; zero-length activities never overlap.
fn overlaps(a: &ScheduledActivity, b: &ScheduledActivity) -> bool {
    a.duration_minutes > 0
        && b.duration_minutes > 0
        && a.start_minute() < b.end_minute()
        && b.start_minute() < a.end_minute()
}

fn conflict(date: NaiveDate, a: &ScheduledActivity, b: &ScheduledActivity) -> TimeConflict {
    let (first, second) = if a.id <= b.id { (a, b) } else { (b, a) };
    TimeConflict {
        conflict_type: ConflictType::Overlap,
        date,
        activity_ids: (first.id.clone(), second.id.clone()),
        window: TimeWindow::from_minutes(
            a.start_minute().min(b.start_minute()),
            a.end_minute().max(b.end_minute()),
        ),
    }
}
