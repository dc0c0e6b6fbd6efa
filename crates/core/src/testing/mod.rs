//! Testing utilities and mock implementations.
//!
//! Mocks for the metadata API and the trending store, so the orchestrator and
//! the server can be exercised without network access or a database.
//!
//! # Example
//!
//! ```rust,ignore
//! use cinetrend_core::testing::{fixtures, MockMetadataClient, MockTrendingStore};
//!
//! let metadata = MockMetadataClient::new();
//! let trending = MockTrendingStore::new();
//!
//! metadata.set_outcome("batman", SearchOutcome::Success(fixtures::movies(3))).await;
//! trending.set_failing(true).await;
//! ```

mod mock_metadata;
mod mock_trending;

pub use mock_metadata::{MockMetadataClient, RecordedFetch};
pub use mock_trending::{MockTrendingStore, RecordedHit};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::metadata::SearchResult;
    use crate::trending::{subject_key, TrendingRecord};

    /// Create a test movie with reasonable defaults.
    pub fn movie(id: u64, title: &str) -> SearchResult {
        SearchResult {
            id,
            title: title.to_string(),
            poster_path: Some(format!("/poster-{}.jpg", id)),
            poster_url: Some(format!("https://image.tmdb.org/t/p/w500/poster-{}.jpg", id)),
            popularity: 100.0 / (id as f64 + 1.0),
            vote_average: Some(7.2),
            original_language: Some("en".to_string()),
            release_date: Some("2001-05-16".to_string()),
        }
    }

    /// Create `count` distinct test movies with IDs starting at 1.
    pub fn movies(count: u64) -> Vec<SearchResult> {
        (1..=count)
            .map(|id| movie(id, &format!("Movie {}", id)))
            .collect()
    }

    /// Create a trending record for a movie.
    pub fn trending_record(movie_id: u64, title: &str, count: u64) -> TrendingRecord {
        TrendingRecord {
            id: subject_key(movie_id),
            search_term: title.to_lowercase(),
            movie_id,
            title: title.to_string(),
            poster_url: Some(format!(
                "https://image.tmdb.org/t/p/w500/poster-{}.jpg",
                movie_id
            )),
            count,
            created_at: Utc::now(),
        }
    }
}
