pub mod config;
pub mod debounce;
pub mod metadata;
pub mod metrics;
pub mod search;
pub mod testing;
pub mod trending;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    SearchConfig, TrendingBackend,
};
pub use debounce::{DebounceHandle, Debouncer};
pub use metadata::{
    MetadataClient, MetadataError, Query, SearchOutcome, SearchResult, TmdbClient, TmdbConfig,
};
pub use search::{
    FetchDisposition, SearchOrchestrator, SearchPhase, TrendRecording, ViewState,
};
pub use trending::{
    AppwriteConfig, AppwriteTrendingStore, SqliteTrendingStore, TrendingError, TrendingRecord,
    TrendingStore,
};
