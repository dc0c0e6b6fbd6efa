//! Types shared by metadata clients and their consumers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// User-facing message for transport, HTTP and parse failures.
pub const REQUEST_FAILED_MESSAGE: &str = "Error fetching movies. Try again later.";

/// Fallback when the provider reports a failure without a message.
pub const PROVIDER_FAILURE_FALLBACK: &str = "Failed to fetch movies";

/// A search query as issued to the metadata API.
///
/// Surrounding whitespace is trimmed on construction. An empty query selects
/// discover mode (popular movies); anything else is a term search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    /// Create a query from raw user input.
    ///
    /// The trimmed term is the one percent-encoded into the request URL and
    /// stored as a trending record's search term, so `" bat"` and `"bat "`
    /// are the same query and whitespace-only input means discover mode.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    /// The empty (discover) query.
    pub fn discover() -> Self {
        Self(String::new())
    }

    /// Whether this query selects discover mode.
    pub fn is_discover(&self) -> bool {
        self.0.is_empty()
    }

    /// The query term.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Query {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// One movie returned by the metadata API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// TMDB movie ID.
    pub id: u64,
    /// Movie title.
    pub title: String,
    /// Poster path (relative to the image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    /// Absolute poster URL, derived from `poster_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    /// Provider popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// Average vote (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    /// ISO 639-1 language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    /// Release date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

/// Normalized outcome of a metadata fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The request succeeded. The list may be empty.
    Success(Vec<SearchResult>),
    /// The request succeeded but nothing matched.
    EmptyResult(String),
    /// The request failed; the message is safe to show to users.
    Failure(String),
}

impl SearchOutcome {
    /// Generic failure for transport, HTTP and parse errors.
    pub fn request_failed() -> Self {
        Self::Failure(REQUEST_FAILED_MESSAGE.to_string())
    }

    /// Turn an empty success into [`SearchOutcome::EmptyResult`].
    pub fn classify_empty(self, query: &Query) -> Self {
        match self {
            Self::Success(results) if results.is_empty() => {
                let message = if query.is_discover() {
                    "No movies found.".to_string()
                } else {
                    format!("No movies found for \"{}\".", query)
                };
                Self::EmptyResult(message)
            }
            other => other,
        }
    }

    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::EmptyResult(_) => "empty",
            Self::Failure(_) => "failure",
        }
    }
}
