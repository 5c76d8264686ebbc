//! Published schedule state
//!
//! Plain data cloned out to subscribers on every change. Only the store's
//! owner task constructs or mutates these values.

use crate::error::FetchError;
use crate::models::{ActivityRecord, DayId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Load phase of one conference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    /// Never loaded successfully and nothing in flight.
    Empty,
    /// A fetch is in flight. Any earlier records stay visible.
    Loading,
    /// Showing the result of the last successful fetch.
    Loaded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayState {
    pub phase: DayPhase,
    pub records: Vec<ActivityRecord>,
    /// Error from the most recent refresh, cleared by the next success.
    pub last_error: Option<FetchError>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DayState {
    pub fn empty() -> Self {
        Self {
            phase: DayPhase::Empty,
            records: Vec::new(),
            last_error: None,
            last_updated: None,
        }
    }

    pub fn has_loaded(&self) -> bool {
        self.last_updated.is_some()
    }

    pub(crate) fn begin_loading(&mut self) {
        self.phase = DayPhase::Loading;
    }

    pub(crate) fn apply_success(&mut self, records: Vec<ActivityRecord>, at: DateTime<Utc>) {
        self.phase = DayPhase::Loaded;
        self.records = records;
        self.last_error = None;
        self.last_updated = Some(at);
    }

    /// Records are left untouched; only the phase and error change.
    pub(crate) fn apply_failure(&mut self, error: FetchError) {
        self.phase = if self.has_loaded() {
            DayPhase::Loaded
        } else {
            DayPhase::Empty
        };
        self.last_error = Some(error);
    }
}

impl Default for DayState {
    fn default() -> Self {
        Self::empty()
    }
}

/// Whole-store view handed to `watch` subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleSnapshot {
    pub days: BTreeMap<DayId, DayState>,
}

impl ScheduleSnapshot {
    pub fn day(&self, day: DayId) -> Option<&DayState> {
        self.days.get(&day)
    }

    pub fn schedule(&self, day: DayId) -> &[ActivityRecord] {
        self.days
            .get(&day)
            .map(|state| state.records.as_slice())
            .unwrap_or(&[])
    }
}
