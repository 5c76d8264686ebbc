use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One scheduled conference activity, as decoded from the schedule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    pub speakers: Vec<String>,
    pub notes: String,
}

impl ActivityRecord {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn has_valid_time_range(&self) -> bool {
        self.start_time <= self.end_time
    }

    /// List-row time text, e.g. `9:00 AM - 10:00 AM`. Rendered in UTC so every
    /// viewer sees the same wall-clock labels as the day boundaries.
    pub fn time_range_label(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%-I:%M %p"),
            self.end_time.format("%-I:%M %p")
        )
    }

    pub fn speakers_label(&self) -> Option<String> {
        if self.speakers.is_empty() {
            None
        } else {
            Some(self.speakers.join(", "))
        }
    }
}
