use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "cx-coach";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Defaults mirrored by `Settings::from_env`.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4.1-nano";
pub const DEFAULT_GUARDRAIL_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;
pub const DEFAULT_RETRIEVAL_TOP_K: usize = 5;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.6;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Sampling temperatures per model role.
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;
pub const GUARDRAIL_TEMPERATURE: f32 = 0.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Runtime settings read once from the environment at process startup and
/// passed explicitly into clients — no hidden global state.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub chat_model: String,
    pub guardrail_model: String,
    pub embedding_model: String,
    pub transcription_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub retrieval_top_k: usize,
    pub similarity_threshold: f32,
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY"))?;

        Ok(Self {
            openai_api_key,
            openai_base_url: var_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            chat_model: var_or("OPENAI_CHAT_MODEL", DEFAULT_CHAT_MODEL),
            guardrail_model: var_or("OPENAI_GUARDRAIL_MODEL", DEFAULT_GUARDRAIL_MODEL),
            embedding_model: var_or("OPENAI_EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            transcription_model: var_or("OPENAI_TRANSCRIPTION_MODEL", DEFAULT_TRANSCRIPTION_MODEL),
            chunk_size: parse_var("FAQ_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse_var("FAQ_CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            retrieval_top_k: parse_var("FAQ_RETRIEVAL_TOP_K", DEFAULT_RETRIEVAL_TOP_K)?,
            similarity_threshold: parse_var(
                "FAQ_SIMILARITY_THRESHOLD",
                DEFAULT_SIMILARITY_THRESHOLD,
            )?,
            request_timeout_secs: parse_var(
                "OPENAI_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: name,
            value: raw,
        }),
    }
}

/// Get the application data directory (~/.cx-coach/)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cx-coach")
}

/// Default SQLite database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("cx-coach.db")
}

/// Default log filter used when RUST_LOG is unset
pub fn default_log_filter() -> &'static str {
    "info,cx_coach=debug"
}
