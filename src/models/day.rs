use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based conference day number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DayId(pub u32);

impl fmt::Display for DayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}", self.0)
    }
}

/// Half-open UTC interval `[start, end)` covering one conference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: start + Duration::hours(24),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// The fixed UTC midnights that open each conference day.
///
/// Boundaries never depend on the viewer's local calendar: a session at
/// 23:30 UTC lands on the same day for everyone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConferenceDays {
    starts: Vec<DateTime<Utc>>,
}

impl ConferenceDays {
    pub fn new(starts: Vec<DateTime<Utc>>) -> AppResult<Self> {
        if starts.is_empty() {
            return Err(AppError::config("at least one conference day is required"));
        }

        for start in &starts {
            if start.num_seconds_from_midnight() != 0 || start.nanosecond() != 0 {
                return Err(AppError::config(format!(
                    "conference day must start at UTC midnight, got {}",
                    start.to_rfc3339()
                )));
            }
        }

        if starts.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(AppError::config("conference days must be strictly increasing"));
        }

        Ok(Self { starts })
    }

    /// The two-day event the schedule table was built for.
    pub fn default_event() -> Self {
        Self {
            starts: vec![
                Utc.with_ymd_and_hms(2024, 2, 8, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 2, 9, 0, 0, 0).unwrap(),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn days(&self) -> impl Iterator<Item = DayId> + '_ {
        (1..=self.starts.len() as u32).map(DayId)
    }

    pub fn contains_day(&self, day: DayId) -> bool {
        day.0 >= 1 && (day.0 as usize) <= self.starts.len()
    }

    pub fn window(&self, day: DayId) -> Option<DayWindow> {
        if !self.contains_day(day) {
            return None;
        }
        Some(DayWindow::starting_at(self.starts[day.0 as usize - 1]))
    }

    /// Which conference day an instant falls on, if any.
    pub fn day_of(&self, instant: DateTime<Utc>) -> Option<DayId> {
        self.days()
            .find(|day| self.window(*day).is_some_and(|w| w.contains(instant)))
    }
}

impl Default for ConferenceDays {
    fn default() -> Self {
        Self::default_event()
    }
}
