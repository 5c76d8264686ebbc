// Schedule source integration
// One authenticated GET against the schedule table, decoded into activity records

use crate::error::FetchError;
use crate::models::ActivityRecord;
use async_trait::async_trait;

pub mod airtable;
pub mod wire;

pub use airtable::ActivityFetcher;

/// Anything that can produce the full, undivided activity list.
///
/// The store only ever talks to this trait; `ActivityFetcher` is the
/// network-backed implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<ActivityRecord>, FetchError>;
}
