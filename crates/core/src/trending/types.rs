use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from trending store operations.
#[derive(Debug, Error)]
pub enum TrendingError {
    /// Local database failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Store unreachable.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Store rejected the request.
    #[error("Store error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Store answered with an unexpected payload.
    #[error("Failed to parse store response: {0}")]
    Parse(String),

    /// Store not configured.
    #[error("Store not configured: {0}")]
    NotConfigured(String),
}

/// Popularity counter for one movie, built from search activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendingRecord {
    /// Subject key (see [`subject_key`]).
    pub id: String,
    /// Search term that first selected this movie.
    pub search_term: String,
    /// TMDB movie ID.
    pub movie_id: u64,
    /// Display title.
    pub title: String,
    /// Absolute poster URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    /// Number of qualifying searches (always >= 1).
    pub count: u64,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Deterministic key for the subject of a search hit.
///
/// Repeated searches that select the same movie share one record.
pub fn subject_key(movie_id: u64) -> String {
    format!("movie-{}", movie_id)
}
