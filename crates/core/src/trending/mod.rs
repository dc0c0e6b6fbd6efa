//! Trending store - popularity counters derived from search activity.
//!
//! Each qualifying search increments the counter of the movie it selected.
//! Counters are shared with every other process using the same store, so the
//! increment-or-create step must be atomic on the store side.

mod appwrite;
mod sqlite;
mod types;

pub use appwrite::{AppwriteConfig, AppwriteTrendingStore};
pub use sqlite::SqliteTrendingStore;
pub use types::*;

use async_trait::async_trait;

use crate::metadata::{Query, SearchResult};

/// Trait for trending storage backends.
#[async_trait]
pub trait TrendingStore: Send + Sync {
    /// Record one search hit for the chosen result.
    ///
    /// Increments the counter of the subject by exactly 1, creating the record
    /// with a count of 1 if it does not exist yet. Returns the updated record.
    async fn record_hit(
        &self,
        query: &Query,
        chosen: &SearchResult,
    ) -> Result<TrendingRecord, TrendingError>;

    /// Get at most `limit` records, highest count first.
    async fn top_trending(&self, limit: usize) -> Result<Vec<TrendingRecord>, TrendingError>;

    /// Backend name used in logs.
    fn backend_name(&self) -> &'static str;
}
