//! TMDB (The Movie Database) API client.
//!
//! Authenticates with a v4 read access token sent as a bearer token.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::{Query, SearchOutcome, SearchResult};
use super::{MetadataClient, MetadataError};
use crate::metrics::{METADATA_FETCHES, METADATA_FETCH_DURATION};

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API read access token (required).
    /// Can use ${ENV_VAR} syntax to read from environment.
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Image base URL for posters.
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    /// Poster size segment (default: w500).
    #[serde(default = "default_poster_size")]
    pub poster_size: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_poster_size() -> String {
    "w500".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl TmdbConfig {
    /// Config with defaults for everything but the token.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            image_base_url: default_image_base_url(),
            poster_size: default_poster_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    image_base_url: String,
    poster_size: String,
    timeout_secs: u64,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, MetadataError> {
        if config.api_key.trim().is_empty() {
            return Err(MetadataError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            poster_size: config.poster_size,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Build the request URL for a query.
    ///
    /// The term is percent-encoded here and the URL is sent as-is, so it is
    /// encoded exactly once.
    pub fn endpoint(&self, query: &Query) -> String {
        if query.is_discover() {
            format!("{}/discover/movie?sort_by=popularity.desc", self.base_url)
        } else {
            format!(
                "{}/search/movie?query={}",
                self.base_url,
                urlencoding::encode(query.as_str())
            )
        }
    }

    /// Absolute poster URL for a poster path.
    pub fn poster_url(&self, poster_path: &str) -> String {
        format!("{}/{}{}", self.image_base_url, self.poster_size, poster_path)
    }

    /// Run the request and return typed errors.
    pub async fn request(&self, query: &Query) -> Result<Vec<SearchResult>, MetadataError> {
        let url = self.endpoint(query);

        debug!("TMDB request: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::Http {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let payload: TmdbListResponse = serde_json::from_str(&body).map_err(|e| {
            MetadataError::Parse(format!("Failed to parse movie list response: {}", e))
        })?;

        if payload.is_logical_failure() {
            return Err(MetadataError::Provider(
                payload.status_message.or(payload.error),
            ));
        }

        Ok(payload
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|r| self.convert(r))
            .collect())
    }

    fn classify(&self, err: reqwest::Error) -> MetadataError {
        if err.is_timeout() {
            MetadataError::Timeout(self.timeout_secs)
        } else {
            MetadataError::Transport(err)
        }
    }

    fn convert(&self, r: TmdbMovieResult) -> SearchResult {
        let poster_url = r.poster_path.as_deref().map(|p| self.poster_url(p));
        SearchResult {
            id: r.id,
            title: r.title,
            poster_path: r.poster_path,
            poster_url,
            popularity: r.popularity.unwrap_or_default(),
            vote_average: r.vote_average,
            original_language: r.original_language,
            release_date: r.release_date.filter(|d| !d.is_empty()),
        }
    }
}

#[async_trait]
impl MetadataClient for TmdbClient {
    async fn fetch(&self, query: &Query) -> SearchOutcome {
        let mode = if query.is_discover() { "discover" } else { "search" };
        let started = Instant::now();

        let outcome = match self.request(query).await {
            Ok(results) => {
                debug!("TMDB {} '{}' returned {} results", mode, query, results.len());
                SearchOutcome::Success(results)
            }
            Err(e) => {
                warn!("Error fetching movies for '{}': {}", query, e);
                e.into_outcome()
            }
        };

        METADATA_FETCH_DURATION
            .with_label_values(&[mode])
            .observe(started.elapsed().as_secs_f64());
        METADATA_FETCHES
            .with_label_values(&[mode, outcome.label()])
            .inc();

        outcome
    }

    fn name(&self) -> &str {
        "tmdb"
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbListResponse {
    #[serde(default)]
    results: Option<Vec<TmdbMovieResult>>,
    /// Present (and false) on TMDB error payloads.
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    status_message: Option<String>,
    /// Legacy failure flag (`"False"` or `0`) used by some proxies.
    #[serde(default, rename = "Response", alias = "response")]
    response: Option<serde_json::Value>,
    #[serde(default, rename = "Error", alias = "error")]
    error: Option<String>,
}

impl TmdbListResponse {
    fn is_logical_failure(&self) -> bool {
        if self.success == Some(false) {
            return true;
        }
        match &self.response {
            Some(serde_json::Value::Bool(false)) => true,
            Some(serde_json::Value::Number(n)) => n.as_i64() == Some(0),
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("false"),
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u64,
    #[serde(default)]
    title: String,
    poster_path: Option<String>,
    popularity: Option<f64>,
    vote_average: Option<f64>,
    original_language: Option<String>,
    release_date: Option<String>,
}
