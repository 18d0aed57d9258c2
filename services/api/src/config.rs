//! services/api/src/config.rs
//!
//! Environment-driven settings for the `api` binary: listener, database,
//! OpenAI credentials and models, CORS origin and the per-call timeouts.
//! A `.env` file is honoured outside of tests.

use std::net::SocketAddr;
use std::time::Duration;

use medha_core::CallTimeouts;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(String),
    #[error("{0} is invalid: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub content_model: String,
    pub image_model: String,
    pub tts_voice: String,
    pub tts_sample_rate: u32,
    pub allowed_origin: String,
    pub timeouts: CallTimeouts,
}

impl Config {
    /// Reads the process environment, after loading `.env` unless compiled for tests.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server and Database Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url =
            var("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Model Provider ---
        let openai_api_key = var("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;
        let openai_base_url = var("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty());
        let content_model = var("CONTENT_MODEL").unwrap_or_else(|| "gpt-4o".to_string());
        let image_model = var("IMAGE_MODEL").unwrap_or_else(|| "dall-e-3".to_string());
        let tts_voice = var("TTS_VOICE").unwrap_or_else(|| "alloy".to_string());
        let tts_sample_rate = parse_number(&var, "TTS_SAMPLE_RATE", 24_000)?;

        let allowed_origin =
            var("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Call Timeouts ---
        let defaults = CallTimeouts::default();
        let timeouts = CallTimeouts {
            primary: Duration::from_secs(parse_number(
                &var,
                "PRIMARY_CALL_TIMEOUT_SECS",
                defaults.primary.as_secs(),
            )?),
            auxiliary: Duration::from_secs(parse_number(
                &var,
                "AUXILIARY_CALL_TIMEOUT_SECS",
                defaults.auxiliary.as_secs(),
            )?),
            store: Duration::from_secs(parse_number(
                &var,
                "STORE_CALL_TIMEOUT_SECS",
                defaults.store.as_secs(),
            )?),
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            openai_base_url,
            content_model,
            image_model,
            tts_voice,
            tts_sample_rate,
            allowed_origin,
            timeouts,
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(name.to_string(), format!("'{}' is not a number", raw))
        }),
    }
}
