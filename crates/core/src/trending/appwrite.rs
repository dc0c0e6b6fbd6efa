//! Appwrite document collection backend.
//!
//! Each subject is a document whose ID is the subject key. Hits go through the
//! server-side attribute increment endpoint, which is atomic; a missing
//! document is created with a count of 1. When two writers race on creation
//! the loser gets a conflict and increments the winner's document instead.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{subject_key, TrendingError, TrendingRecord, TrendingStore};
use crate::metadata::{Query, SearchResult};

/// Appwrite store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppwriteConfig {
    /// API endpoint (e.g., "https://cloud.appwrite.io/v1")
    pub endpoint: String,
    pub project_id: String,
    /// Server API key with documents read/write scope.
    /// Can use ${ENV_VAR} syntax to read from environment.
    pub api_key: String,
    pub database_id: String,
    pub collection_id: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

/// Trending store backed by an Appwrite collection.
pub struct AppwriteTrendingStore {
    client: Client,
    documents_url: String,
    project_id: String,
    api_key: String,
}

impl AppwriteTrendingStore {
    /// Create a new Appwrite store.
    pub fn new(config: AppwriteConfig) -> Result<Self, TrendingError> {
        if config.api_key.is_empty() || config.project_id.is_empty() {
            return Err(TrendingError::NotConfigured(
                "Appwrite project_id and api_key are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let documents_url = format!(
            "{}/databases/{}/collections/{}/documents",
            config.endpoint.trim_end_matches('/'),
            config.database_id,
            config.collection_id
        );

        Ok(Self {
            client,
            documents_url,
            project_id: config.project_id,
            api_key: config.api_key,
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
    }

    /// Atomically add 1 to the count of an existing document.
    ///
    /// Returns `None` if the document does not exist.
    async fn increment(&self, key: &str) -> Result<Option<TrendingRecord>, TrendingError> {
        let url = format!("{}/{}/count/increment", self.documents_url, key);
        debug!("Appwrite increment: {}", key);

        let response = self
            .request(reqwest::Method::PATCH, &url)
            .json(&json!({ "value": 1 }))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => parse_document(response).await.map(Some),
            status => Err(api_error(status, response).await),
        }
    }

    /// Create a document with a count of 1.
    ///
    /// Returns `None` if a document with this key already exists.
    async fn create(
        &self,
        key: &str,
        query: &Query,
        chosen: &SearchResult,
    ) -> Result<Option<TrendingRecord>, TrendingError> {
        debug!("Appwrite create: {}", key);

        let body = json!({
            "documentId": key,
            "data": {
                "searchTerm": query.as_str(),
                "count": 1,
                "movieId": chosen.id,
                "title": chosen.title,
                "posterUrl": chosen.poster_url,
            }
        });

        let response = self
            .request(reqwest::Method::POST, &self.documents_url)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::CONFLICT => Ok(None),
            status if status.is_success() => parse_document(response).await.map(Some),
            status => Err(api_error(status, response).await),
        }
    }
}

#[async_trait]
impl TrendingStore for AppwriteTrendingStore {
    async fn record_hit(
        &self,
        query: &Query,
        chosen: &SearchResult,
    ) -> Result<TrendingRecord, TrendingError> {
        let key = subject_key(chosen.id);

        if let Some(record) = self.increment(&key).await? {
            return Ok(record);
        }
        if let Some(record) = self.create(&key, query, chosen).await? {
            return Ok(record);
        }

        // Lost a creation race; the document exists now
        debug!("Appwrite create conflict for {}, incrementing", key);
        self.increment(&key).await?.ok_or_else(|| TrendingError::Api {
            status: StatusCode::NOT_FOUND.as_u16(),
            message: format!("document {} missing after create conflict", key),
        })
    }

    async fn top_trending(&self, limit: usize) -> Result<Vec<TrendingRecord>, TrendingError> {
        let order = json!({ "method": "orderDesc", "attribute": "count" }).to_string();
        let limit_query = json!({ "method": "limit", "values": [limit] }).to_string();

        let response = self
            .request(reqwest::Method::GET, &self.documents_url)
            .query(&[("queries[]", order), ("queries[]", limit_query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let list: DocumentList = response
            .json()
            .await
            .map_err(|e| TrendingError::Parse(e.to_string()))?;

        let mut records: Vec<TrendingRecord> =
            list.documents.into_iter().map(TrendingRecord::from).collect();
        records.truncate(limit);
        Ok(records)
    }

    fn backend_name(&self) -> &'static str {
        "appwrite"
    }
}

async fn parse_document(response: reqwest::Response) -> Result<TrendingRecord, TrendingError> {
    response
        .json::<Document>()
        .await
        .map(TrendingRecord::from)
        .map_err(|e| TrendingError::Parse(e.to_string()))
}

async fn api_error(status: StatusCode, response: reqwest::Response) -> TrendingError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    TrendingError::Api {
        status: status.as_u16(),
        message,
    }
}

// ============================================================================
// Appwrite API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "$createdAt")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    search_term: String,
    movie_id: u64,
    #[serde(default)]
    title: String,
    poster_url: Option<String>,
    count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl From<Document> for TrendingRecord {
    fn from(d: Document) -> Self {
        Self {
            id: d.id,
            search_term: d.search_term,
            movie_id: d.movie_id,
            title: d.title,
            poster_url: d.poster_url,
            count: d.count,
            created_at: d.created_at.unwrap_or_else(Utc::now),
        }
    }
}
