//! Layered client configuration.
//!
//! Values resolve in priority order (highest first):
//! 1. Environment variables (`TODOSYNC_*`)
//! 2. TOML config file
//! 3. Compiled defaults
//!
//! Environment lookup is passed in as a closure so callers decide where
//! variables come from.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::task::domain::PageSize;

/// Default base URL of the remote service.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default whole-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable overriding the API base URL.
pub const ENV_API_URL: &str = "TODOSYNC_API_URL";
/// Environment variable overriding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "TODOSYNC_TIMEOUT_SECS";
/// Environment variable overriding the default page size.
pub const ENV_PAGE_SIZE: &str = "TODOSYNC_PAGE_SIZE";
/// Environment variable naming the storage directory.
pub const ENV_STORAGE_DIR: &str = "TODOSYNC_STORAGE_DIR";
/// Environment variable overriding the log filter.
pub const ENV_LOG: &str = "TODOSYNC_LOG";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The API URL could not be parsed.
    #[error("invalid API URL {value}: {source}")]
    InvalidUrl {
        /// Rejected value.
        value: String,
        /// Parser error.
        source: url::ParseError,
    },

    /// The API URL is not HTTP(S).
    #[error("API URL must use http or https, got {0}")]
    UnsupportedScheme(String),

    /// An environment variable did not hold a number.
    #[error("{variable} must be a whole number, got {value:?}")]
    InvalidNumber {
        /// Variable name.
        variable: &'static str,
        /// Rejected value.
        value: String,
    },

    /// The page size was outside `1..=100`.
    #[error("page size must be between 1 and 100, got {0}")]
    InvalidPageSize(u32),

    /// The timeout was zero.
    #[error("request timeout must be at least one second")]
    ZeroTimeout,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ClientConfigFile {
    api: ApiFileConfig,
    storage: StorageFileConfig,
    logging: LoggingFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ApiFileConfig {
    url: Option<String>,
    timeout_secs: Option<u64>,
    page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StorageFileConfig {
    dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LoggingFileConfig {
    filter: Option<String>,
}

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the remote service.
    pub api_url: Url,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Page size used when a fetch does not request one.
    pub page_size: PageSize,
    /// Directory for durable storage; `None` keeps state in memory.
    pub storage_dir: Option<Utf8PathBuf>,
    /// Log filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl ClientConfig {
    /// Resolves configuration from an optional TOML file and the
    /// environment.
    ///
    /// An explicitly named file must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// when any resolved value is out of range.
    pub fn load<F>(path: Option<&Utf8Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(file_path) = path else {
            return Self::resolve(ClientConfigFile::default(), env);
        };
        let contents =
            std::fs::read_to_string(file_path).map_err(|source| ConfigError::ReadFile {
                path: file_path.to_owned(),
                source,
            })?;
        Self::from_toml(&contents, env)
    }

    /// Resolves configuration from TOML text and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text is not valid for the schema or
    /// when any resolved value is out of range.
    pub fn from_toml<F>(contents: &str, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(toml::from_str(contents)?, env)
    }

    fn resolve<F>(file: ClientConfigFile, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = env(ENV_API_URL)
            .or(file.api.url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let timeout_secs = parse_env(&env, ENV_TIMEOUT_SECS)?
            .or(file.api.timeout_secs)
            .unwrap_or_else(|| DEFAULT_TIMEOUT.as_secs());
        let page_size = parse_env(&env, ENV_PAGE_SIZE)?.or(file.api.page_size);

        if timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self {
            api_url: parse_api_url(&raw_url)?,
            timeout: Duration::from_secs(timeout_secs),
            page_size: page_size
                .map(|value| PageSize::new(value).map_err(|_| ConfigError::InvalidPageSize(value)))
                .transpose()?
                .unwrap_or_default(),
            storage_dir: env(ENV_STORAGE_DIR)
                .map(Utf8PathBuf::from)
                .or(file.storage.dir),
            log_filter: env(ENV_LOG)
                .or(file.logging.filter)
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned()),
        })
    }
}

fn parse_env<T, F>(env: &F, variable: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    env(variable)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidNumber { variable, value })
        })
        .transpose()
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        value: raw.to_owned(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_owned())),
    }
}
