use super::{
    types::{Config, TrendingBackend},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Metadata API token is present
/// - Request timeouts are positive
/// - Debounce period and trending limit are positive
/// - The selected trending backend has its section
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.metadata.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "metadata.api_key is required (TMDB API read access token)".to_string(),
        ));
    }

    if config.metadata.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "metadata.timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.search.debounce_ms == 0 {
        return Err(ConfigError::ValidationError(
            "search.debounce_ms must be greater than 0".to_string(),
        ));
    }

    if config.search.trending_limit == 0 {
        return Err(ConfigError::ValidationError(
            "search.trending_limit must be greater than 0".to_string(),
        ));
    }

    if config.trending.backend == TrendingBackend::Appwrite {
        match &config.trending.appwrite {
            None => {
                return Err(ConfigError::ValidationError(
                    "trending.backend = \"appwrite\" requires a [trending.appwrite] section"
                        .to_string(),
                ))
            }
            Some(appwrite) if appwrite.api_key.is_empty() => {
                return Err(ConfigError::ValidationError(
                    "trending.appwrite.api_key is required".to_string(),
                ))
            }
            Some(appwrite) if appwrite.timeout_secs == 0 => {
                return Err(ConfigError::ValidationError(
                    "trending.appwrite.timeout_secs must be greater than 0".to_string(),
                ))
            }
            Some(_) => {}
        }
    }

    Ok(())
}
