//! Mock trending store for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::metadata::{Query, SearchResult};
use crate::trending::{subject_key, TrendingError, TrendingRecord, TrendingStore};

/// A recorded hit for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedHit {
    /// The query that produced the hit.
    pub query: Query,
    /// ID of the chosen movie.
    pub movie_id: u64,
}

/// In-memory implementation of the TrendingStore trait.
///
/// Records are kept in insertion order so ties in `top_trending` resolve the
/// same way as the real stores. When failing, every call returns an error and
/// nothing is stored.
#[derive(Debug, Default)]
pub struct MockTrendingStore {
    records: Arc<RwLock<Vec<TrendingRecord>>>,
    hits: Arc<RwLock<Vec<RecordedHit>>>,
    failing: Arc<RwLock<bool>>,
}

impl MockTrendingStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store seeded with records.
    pub fn with_records(records: Vec<TrendingRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
            ..Self::default()
        }
    }

    /// Make every call fail (or succeed again).
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    /// Get stored records in insertion order.
    pub async fn records(&self) -> Vec<TrendingRecord> {
        self.records.read().await.clone()
    }

    /// Get recorded hits, including rejected ones.
    pub async fn recorded_hits(&self) -> Vec<RecordedHit> {
        self.hits.read().await.clone()
    }

    /// Clear recorded hits. Stored records are kept.
    pub async fn clear_recorded(&self) {
        self.hits.write().await.clear();
    }

    async fn check_failing(&self) -> Result<(), TrendingError> {
        if *self.failing.read().await {
            return Err(TrendingError::Api {
                status: 503,
                message: "mock trending store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TrendingStore for MockTrendingStore {
    async fn record_hit(
        &self,
        query: &Query,
        chosen: &SearchResult,
    ) -> Result<TrendingRecord, TrendingError> {
        self.hits.write().await.push(RecordedHit {
            query: query.clone(),
            movie_id: chosen.id,
        });
        self.check_failing().await?;

        let key = subject_key(chosen.id);
        let mut records = self.records.write().await;
        if let Some(record) = records.iter_mut().find(|r| r.id == key) {
            record.count += 1;
            return Ok(record.clone());
        }

        let record = TrendingRecord {
            id: key,
            search_term: query.as_str().to_string(),
            movie_id: chosen.id,
            title: chosen.title.clone(),
            poster_url: chosen.poster_url.clone(),
            count: 1,
            created_at: Utc::now(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn top_trending(&self, limit: usize) -> Result<Vec<TrendingRecord>, TrendingError> {
        self.check_failing().await?;

        let mut records = self.records.read().await.clone();
        // Stable sort keeps insertion order among equal counts
        records.sort_by(|a, b| b.count.cmp(&a.count));
        records.truncate(limit);
        Ok(records)
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}
