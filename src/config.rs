//! Configuration types for taskfeed

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Fetch/consume engine settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TaskConfig {
    /// Items requested from the catalog per fetch tick (default: 200)
    #[serde(default = "default_scan_size")]
    pub scan_size: usize,

    /// Soft cap on queued items (default: 1000)
    ///
    /// A fetch tick is skipped while the queue holds more than
    /// `max_queue_size - scan_size` items.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// Delay between fetch ticks in milliseconds (default: 1000)
    #[serde(default = "default_poll_interval", with = "duration_millis_serde")]
    pub poll_interval: Duration,

    /// Cron expression for scheduled runs (default: hourly, "0 * * * *")
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            scan_size: default_scan_size(),
            max_queue_size: default_max_queue_size(),
            poll_interval: default_poll_interval(),
            schedule: default_schedule(),
        }
    }
}

impl TaskConfig {
    /// Reject sizes and intervals the fetch loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.scan_size == 0 {
            return Err(config_error("scan_size", "scan_size must be greater than 0"));
        }
        if self.max_queue_size < self.scan_size {
            return Err(config_error(
                "max_queue_size",
                format!(
                    "max_queue_size ({}) must be at least scan_size ({})",
                    self.max_queue_size, self.scan_size
                ),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(config_error(
                "poll_interval",
                "poll_interval must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Queue length above which fetch ticks are skipped
    pub fn backpressure_threshold(&self) -> usize {
        self.max_queue_size.saturating_sub(self.scan_size)
    }
}

/// Remote catalog settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// Scan endpoint of the catalog service (default: http://127.0.0.1:8080/scan)
    #[serde(default = "default_catalog_url")]
    pub base_url: String,

    /// Timeout for a single scan request in seconds (default: 30)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Data storage settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersistenceConfig {
    /// SQLite database backing the key-value store (default: "./taskfeed.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key required in the X-Api-Key header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Fetch/consume engine settings
    #[serde(default)]
    pub tasks: TaskConfig,

    /// Remote catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Key-value store settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Parse a JSON config document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        self.tasks.validate()?;
        crate::scheduler::CronSchedule::parse(&self.tasks.schedule)?;
        url::Url::parse(&self.catalog.base_url).map_err(|e| {
            config_error("base_url", format!("invalid catalog URL '{}': {}", self.catalog.base_url, e))
        })?;
        Ok(())
    }
}

fn config_error(key: &str, message: impl Into<String>) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.to_string()),
    }
}

fn default_scan_size() -> usize {
    200
}

fn default_max_queue_size() -> usize {
    1000
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_schedule() -> String {
    "0 * * * *".to_string()
}

fn default_catalog_url() -> String {
    "http://127.0.0.1:8080/scan".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./taskfeed.db")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
