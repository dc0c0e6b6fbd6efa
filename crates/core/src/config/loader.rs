use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable prefix for overrides (e.g. `CINETREND_METADATA__API_KEY`).
pub const ENV_PREFIX: &str = "CINETREND_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let mut config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    resolve_secrets(&mut config)?;
    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let mut config: Config =
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    resolve_secrets(&mut config)?;
    Ok(config)
}

/// Replace `${VAR}` secret values with the referenced environment variable.
fn resolve_secrets(config: &mut Config) -> Result<(), ConfigError> {
    config.metadata.api_key = expand_env_ref("metadata.api_key", &config.metadata.api_key)?;
    if let Some(appwrite) = config.trending.appwrite.as_mut() {
        appwrite.api_key = expand_env_ref("trending.appwrite.api_key", &appwrite.api_key)?;
    }
    Ok(())
}

fn expand_env_ref(field: &str, value: &str) -> Result<String, ConfigError> {
    let Some(var) = value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return Ok(value.to_string());
    };

    std::env::var(var).map_err(|_| ConfigError::MissingEnvVar {
        field: field.to_string(),
        var: var.to_string(),
    })
}
