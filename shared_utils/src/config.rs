//! Application configuration assembled from the environment at startup.
//!
//! The resulting [`AppConfig`] is immutable and passed by reference (or
//! `Arc`) into every component; nothing in the workspace reads environment
//! variables after startup. An empty variable counts as unset.

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Environment variable holding the FRED API credential.
pub const API_KEY_VAR: &str = "FRED_API_KEY";
/// Optional override for the on-disk data root.
pub const DATA_ROOT_VAR: &str = "FRED_DATA_ROOT";
/// Optional override for the tool-call worker pool size.
pub const WORKER_LIMIT_VAR: &str = "FRED_WORKER_LIMIT";
/// Optional override for the per-build gateway fan-out cap.
pub const FETCH_CONCURRENCY_VAR: &str = "FRED_FETCH_CONCURRENCY";
/// Optional override for the gateway retry budget.
pub const RETRY_BUDGET_VAR: &str = "FRED_RETRY_BUDGET";

const DEFAULT_DATA_ROOT: &str = "fred_data";
const DEFAULT_WORKER_LIMIT: usize = 4;
const DEFAULT_FETCH_CONCURRENCY: usize = 4;
const DEFAULT_RETRY_BUDGET: u32 = 4;

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The FRED credential (or another required variable) is absent.
    #[error("{0} must be set in the environment")]
    MissingEnvVar(String),

    /// An override variable is set but does not parse as the expected type.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },
}

/// Immutable configuration record for the whole process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// FRED API credential. Never logged or serialized.
    pub api_key: SecretString,
    /// Root directory for series folders and dataset folders.
    pub data_root: PathBuf,
    /// Maximum number of tool invocations executing concurrently.
    pub worker_limit: usize,
    /// Per-build cap on concurrent gateway fetches.
    pub fetch_concurrency: usize,
    /// Maximum attempts for a retryable gateway call.
    pub retry_budget: u32,
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    ///
    /// `FRED_API_KEY` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = optional_env(API_KEY_VAR)
            .ok_or_else(|| ConfigError::MissingEnvVar(API_KEY_VAR.to_string()))?;

        let data_root = optional_env(DATA_ROOT_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_ROOT));

        let worker_limit = parse_override(WORKER_LIMIT_VAR, DEFAULT_WORKER_LIMIT)?;
        let fetch_concurrency = parse_override(FETCH_CONCURRENCY_VAR, DEFAULT_FETCH_CONCURRENCY)?;
        let retry_budget = parse_override(RETRY_BUDGET_VAR, DEFAULT_RETRY_BUDGET)?;

        Ok(Self {
            api_key: SecretString::new(api_key.into()),
            data_root,
            worker_limit: worker_limit.max(1),
            fetch_concurrency: fetch_concurrency.max(1),
            retry_budget: retry_budget.max(1),
        })
    }
}

/// Reads a variable, treating unset and empty the same way.
fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_override<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match optional_env(name) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw,
        }),
    }
}
