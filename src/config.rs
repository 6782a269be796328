use std::env;
use std::sync::OnceLock;

use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docsum CLI.
#[derive(Debug)]
pub struct Config {
    /// Credential forwarded to the summarization service.
    ///
    /// Absence is deliberately not validated here; an empty key surfaces as an
    /// authentication failure from the remote call.
    pub api_key: String,
    /// Optional override for the service base URL.
    pub api_url: Option<String>,
    /// Optional override for the completion model identifier.
    pub model: Option<String>,
    /// Optional override for the per-request chunk budget, in characters.
    pub max_chunk_size: Option<usize>,
    /// Optional override for the transient-failure retry delay, in seconds.
    pub retry_delay_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            api_url: load_env_optional("DOCSUM_API_URL"),
            model: load_env_optional("DOCSUM_MODEL"),
            max_chunk_size: load_env_optional("DOCSUM_MAX_CHUNK_SIZE")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("DOCSUM_MAX_CHUNK_SIZE".to_string()))
                })
                .transpose()?,
            retry_delay_secs: load_env_optional("DOCSUM_RETRY_DELAY_SECS")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("DOCSUM_RETRY_DELAY_SECS".to_string()))
                })
                .transpose()?,
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        api_url = ?config.api_url,
        model = ?config.model,
        max_chunk_size = ?config.max_chunk_size,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
