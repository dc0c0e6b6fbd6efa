//! Mock metadata client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::metadata::{MetadataClient, Query, SearchOutcome};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    /// The query that was fetched.
    pub query: Query,
    /// False if the fetch was dropped before its outcome was produced.
    pub completed: bool,
}

/// Mock implementation of the MetadataClient trait.
///
/// Outcomes are scripted per query term; unscripted queries return an empty
/// success. Delays simulate slow responses so stale fetches can be exercised
/// under paused time.
///
/// # Example
///
/// ```rust,ignore
/// use cinetrend_core::testing::{MockMetadataClient, fixtures};
///
/// let client = MockMetadataClient::new();
/// client.set_outcome("batman", SearchOutcome::Success(fixtures::movies(3))).await;
/// client.set_delay("batman", Duration::from_millis(300)).await;
///
/// let outcome = client.fetch(&Query::new("batman")).await;
/// assert_eq!(client.fetch_count().await, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockMetadataClient {
    /// Scripted outcomes keyed by query term.
    outcomes: Arc<RwLock<HashMap<String, SearchOutcome>>>,
    /// Simulated response delays keyed by query term.
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    /// Query terms whose fetch panics.
    panics: Arc<RwLock<HashSet<String>>>,
    /// Recorded fetches in call order.
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
}

impl MockMetadataClient {
    /// Create a new mock with no scripted outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome for a query term (trimmed like a real query).
    pub async fn set_outcome(&self, term: &str, outcome: SearchOutcome) {
        self.outcomes
            .write()
            .await
            .insert(Query::new(term).as_str().to_string(), outcome);
    }

    /// Delay responses for a query term.
    pub async fn set_delay(&self, term: &str, delay: Duration) {
        self.delays
            .write()
            .await
            .insert(Query::new(term).as_str().to_string(), delay);
    }

    /// Make fetches for a query term panic.
    pub async fn set_panic(&self, term: &str) {
        self.panics
            .write()
            .await
            .insert(Query::new(term).as_str().to_string());
    }

    /// Get recorded fetches.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    /// Get the number of fetches started.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    /// Clear recorded fetches.
    pub async fn clear_recorded(&self) {
        self.fetches.write().await.clear();
    }
}

#[async_trait]
impl MetadataClient for MockMetadataClient {
    async fn fetch(&self, query: &Query) -> SearchOutcome {
        let index = {
            let mut fetches = self.fetches.write().await;
            fetches.push(RecordedFetch {
                query: query.clone(),
                completed: false,
            });
            fetches.len() - 1
        };

        let delay = self.delays.read().await.get(query.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let should_panic = self.panics.read().await.contains(query.as_str());
        if should_panic {
            panic!("mock metadata client panicked for '{}'", query);
        }

        let outcome = self
            .outcomes
            .read()
            .await
            .get(query.as_str())
            .cloned()
            .unwrap_or_else(|| SearchOutcome::Success(Vec::new()));

        if let Some(fetch) = self.fetches.write().await.get_mut(index) {
            fetch.completed = true;
        }
        outcome
    }

    fn name(&self) -> &str {
        "mock"
    }
}
