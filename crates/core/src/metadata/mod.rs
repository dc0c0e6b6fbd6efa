//! Movie metadata lookups (TMDB).
//!
//! A [`MetadataClient`] issues either a discover request (empty query) or a
//! term search and normalizes every response into a [`SearchOutcome`]. It is
//! the failure boundary of the search pipeline: raw transport and parse errors
//! are logged here and never reach the view.

mod tmdb;
mod types;

pub use tmdb::{TmdbClient, TmdbConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the metadata API.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Network, DNS or connection failure.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Http { status: u16, message: String },

    /// The API answered 2xx but flagged the request as failed.
    #[error("Provider reported failure: {}", .0.as_deref().unwrap_or("no message"))]
    Provider(Option<String>),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl MetadataError {
    /// Map this error to the outcome shown to users.
    pub fn into_outcome(self) -> SearchOutcome {
        match self {
            Self::Provider(message) => SearchOutcome::Failure(
                message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| PROVIDER_FAILURE_FALLBACK.to_string()),
            ),
            _ => SearchOutcome::request_failed(),
        }
    }
}

/// Trait for movie metadata sources.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Fetch movies for a query. Never fails: errors become [`SearchOutcome::Failure`].
    async fn fetch(&self, query: &Query) -> SearchOutcome;

    /// Name used in logs.
    fn name(&self) -> &str;
}
