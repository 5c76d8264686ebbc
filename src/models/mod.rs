// Schedule domain types

pub mod activity;
pub mod day;

pub use activity::ActivityRecord;
pub use day::{ConferenceDays, DayId, DayWindow};
