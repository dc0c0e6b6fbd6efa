use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::metadata::TmdbConfig;
use crate::trending::AppwriteConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub metadata: TmdbConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub trending: TrendingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Search orchestration tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Quiet period before a typed query is sent (milliseconds).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Number of trending entries loaded into the view.
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            trending_limit: default_trending_limit(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_trending_limit() -> usize {
    5
}

/// Trending store configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrendingConfig {
    #[serde(default)]
    pub backend: TrendingBackend,
    #[serde(default)]
    pub sqlite: SqliteConfig,
    /// Appwrite-specific configuration (required when backend = "appwrite")
    #[serde(default)]
    pub appwrite: Option<AppwriteConfig>,
}

/// Available trending store backends
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendingBackend {
    #[default]
    Sqlite,
    Appwrite,
}

/// SQLite trending store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cinetrend.db")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub metadata: SanitizedMetadataConfig,
    pub search: SearchConfig,
    pub trending: SanitizedTrendingConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMetadataConfig {
    pub base_url: String,
    pub image_base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTrendingConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appwrite: Option<SanitizedAppwriteConfig>,
}

/// Sanitized Appwrite config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAppwriteConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let trending = &config.trending;
        Self {
            server: config.server.clone(),
            metadata: SanitizedMetadataConfig {
                base_url: config.metadata.base_url.clone(),
                image_base_url: config.metadata.image_base_url.clone(),
                api_key_configured: !config.metadata.api_key.is_empty(),
                timeout_secs: config.metadata.timeout_secs,
            },
            search: config.search.clone(),
            trending: SanitizedTrendingConfig {
                backend: match trending.backend {
                    TrendingBackend::Sqlite => "sqlite".to_string(),
                    TrendingBackend::Appwrite => "appwrite".to_string(),
                },
                sqlite_path: match trending.backend {
                    TrendingBackend::Sqlite => Some(trending.sqlite.path.clone()),
                    TrendingBackend::Appwrite => None,
                },
                appwrite: trending
                    .appwrite
                    .as_ref()
                    .map(|a| SanitizedAppwriteConfig {
                        endpoint: a.endpoint.clone(),
                        project_id: a.project_id.clone(),
                        database_id: a.database_id.clone(),
                        collection_id: a.collection_id.clone(),
                        api_key_configured: !a.api_key.is_empty(),
                    }),
            },
        }
    }
}
