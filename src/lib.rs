// Conference schedule client library
// Fetches the activity table, splits it into conference days and publishes per-day schedules

pub mod config;
pub mod error;
pub mod fetch;
pub mod http_config;
pub mod models;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::ScheduleConfig;
pub use error::{AppError, AppResult, FetchError};
pub use fetch::{ActivityFetcher, ActivitySource};
pub use models::*;
pub use store::{DayPhase, DayState, RefreshOutcome, ScheduleSnapshot, ScheduleStore, StoreEvent};
