use crate::models::{ActivityRecord, ConferenceDays, DayWindow};
use std::collections::HashSet;

/// Restrict the full record set to one day window.
///
/// Duplicate ids keep their first occurrence in response order. The result is
/// ordered by start, then end, then id so equal start times stay stable
/// across fetches.
pub fn build_day_schedule(window: &DayWindow, records: &[ActivityRecord]) -> Vec<ActivityRecord> {
    let mut seen = HashSet::new();
    let mut schedule: Vec<ActivityRecord> = records
        .iter()
        .filter(|&record| seen.insert(record.id.as_str()))
        .filter(|record| window.contains(record.start_time))
        .cloned()
        .collect();

    schedule.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.end_time.cmp(&b.end_time))
            .then_with(|| a.id.cmp(&b.id))
    });
    schedule
}

/// Records that fall on none of the configured days.
pub fn count_unscheduled(days: &ConferenceDays, records: &[ActivityRecord]) -> usize {
    records
        .iter()
        .filter(|record| days.day_of(record.start_time).is_none())
        .count()
}
