//! Connection settings for the HTTP Data API backend.
//!
//! Settings are always passed explicitly to the backend; nothing is read from the
//! environment unless [`DataApiConfig::from_env`] is called.

use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

use docmodel_core::error::{DataApiError, DataApiResult};

/// Data source used when none is configured.
pub const DEFAULT_DATA_SOURCE: &str = "mongodb-atlas";

/// Environment variable holding the Data API base URL.
pub const ENV_BASE_URL: &str = "DOCMODEL_DATA_API_URL";
/// Environment variable holding the Data API key.
pub const ENV_API_KEY: &str = "DOCMODEL_DATA_API_KEY";
/// Environment variable holding the data source (cluster) name.
pub const ENV_DATA_SOURCE: &str = "DOCMODEL_DATA_SOURCE";
/// Environment variable holding the database name.
pub const ENV_DATABASE: &str = "DOCMODEL_DATABASE";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "DOCMODEL_TIMEOUT_SECS";

/// Everything needed to reach one database through the Data API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataApiConfig {
    /// Endpoint prefix; actions are posted to `{base_url}/action/{action}`.
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_data_source")]
    pub data_source: String,
    pub database: String,
    /// Per-request timeout. `None` leaves timeouts to the HTTP client defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_data_source() -> String {
    DEFAULT_DATA_SOURCE.to_string()
}

impl DataApiConfig {
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: String::new(),
            data_source: default_data_source(),
            database: database.into(),
            timeout_secs: None,
        }
    }

    /// Loads the configuration from `DOCMODEL_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`DataApiError::Initialization`] when a required variable is missing or
    /// the timeout is not a number.
    pub fn from_env() -> DataApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DataApiResult<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| DataApiError::Initialization(format!("{key} is not set")))
        };

        let timeout_secs = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => Some(raw.parse::<u64>().map_err(|e| {
                DataApiError::Initialization(format!("{ENV_TIMEOUT_SECS}: {e}"))
            })?),
            None => None,
        };

        Ok(Self {
            base_url: required(ENV_BASE_URL)?,
            api_key: required(ENV_API_KEY)?,
            data_source: lookup(ENV_DATA_SOURCE).unwrap_or_else(default_data_source),
            database: required(ENV_DATABASE)?,
            timeout_secs,
        })
    }

    /// Checks that the settings can produce a working backend.
    ///
    /// # Errors
    ///
    /// Returns [`DataApiError::Initialization`] describing the first problem found.
    pub fn validate(&self) -> DataApiResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(DataApiError::Initialization(format!(
                "base url must be http(s), got {:?}",
                self.base_url
            )));
        }
        if self.data_source.is_empty() {
            return Err(DataApiError::Initialization("data source is empty".into()));
        }
        if self.database.is_empty() {
            return Err(DataApiError::Initialization("database is empty".into()));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl fmt::Debug for DataApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("data_source", &self.data_source)
            .field("database", &self.database)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
