//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings shared by every service
    #[serde(default)]
    pub http: HttpConfig,

    /// 429 retry policy
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Cross-reference database source
    #[serde(default)]
    pub arm: ArmConfig,

    /// Annict API settings
    #[serde(default = "defaults::annict")]
    pub annict: ServiceConfig,

    /// AniList API settings
    #[serde(default = "defaults::anilist")]
    pub anilist: ServiceConfig,

    /// Reconciliation behavior
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.sync.max_concurrent == 0 {
            return Err(AppError::validation("sync.max_concurrent must be > 0"));
        }
        if self.annict.page_size == 0 || self.anilist.page_size == 0 {
            return Err(AppError::validation("page_size must be > 0"));
        }
        if self.sync.report_path.as_os_str().is_empty() {
            return Err(AppError::validation("sync.report_path is empty"));
        }
        url::Url::parse(&self.arm.url)?;
        url::Url::parse(&self.annict.endpoint)?;
        url::Url::parse(&self.anilist.endpoint)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            rate_limit: RateLimitConfig::default(),
            arm: ArmConfig::default(),
            annict: defaults::annict(),
            anilist: defaults::anilist(),
            sync: SyncConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for every request
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Retry policy for HTTP 429 responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Retries per request chain
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Largest `Retry-After` value honoured, in seconds
    #[serde(default = "defaults::max_retry_after")]
    pub max_retry_after_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            max_retry_after_secs: defaults::max_retry_after(),
        }
    }
}

/// Cross-reference database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmConfig {
    #[serde(default = "defaults::arm_url")]
    pub url: String,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            url: defaults::arm_url(),
        }
    }
}

/// Settings of one GraphQL service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// GraphQL endpoint URL
    pub endpoint: String,

    /// Bearer token; takes precedence over `token_file`
    #[serde(default)]
    pub access_token: Option<String>,

    /// Token JSON file name, relative to `sync.token_directory`
    pub token_file: String,

    /// Entries per page (Annict `first`, AniList `perChunk`)
    pub page_size: u32,
}

/// Reconciliation behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Compute and log the diff without touching AniList
    #[serde(default)]
    pub dry_run: bool,

    /// Maximum concurrent AniList updates
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Pause between two pages of the same partition, in milliseconds
    #[serde(default)]
    pub page_delay_ms: u64,

    /// Annict work IDs never synchronised
    #[serde(default)]
    pub ignored_annict_ids: Vec<u64>,

    /// AniList media IDs never touched
    #[serde(default)]
    pub ignored_anilist_ids: Vec<u64>,

    /// Untethered report output path
    #[serde(default = "defaults::report_path")]
    pub report_path: PathBuf,

    /// Directory holding the token files
    #[serde(default = "defaults::token_directory")]
    pub token_directory: PathBuf,
}

impl SyncConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_concurrent: defaults::max_concurrent(),
            page_delay_ms: 0,
            ignored_annict_ids: Vec::new(),
            ignored_anilist_ids: Vec::new(),
            report_path: defaults::report_path(),
            token_directory: defaults::token_directory(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::ServiceConfig;

    // HTTP defaults
    pub fn user_agent() -> String {
        "animesync/0.1".into()
    }
    pub fn timeout() -> u64 {
        15
    }

    // Rate limit defaults
    pub fn max_retries() -> u32 {
        5
    }
    pub fn max_retry_after() -> u64 {
        300
    }

    pub fn arm_url() -> String {
        "https://raw.githubusercontent.com/SlashNephy/arm-supplementary/master/dist/arm.json".into()
    }

    // Service defaults
    pub fn annict() -> ServiceConfig {
        ServiceConfig {
            endpoint: "https://api.annict.com/graphql".into(),
            access_token: None,
            token_file: "token-annict.json".into(),
            page_size: 50,
        }
    }
    pub fn anilist() -> ServiceConfig {
        ServiceConfig {
            endpoint: "https://graphql.anilist.co".into(),
            access_token: None,
            token_file: "token-anilist.json".into(),
            page_size: 500,
        }
    }

    // Sync defaults
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn report_path() -> PathBuf {
        PathBuf::from("untethered.json")
    }
    pub fn token_directory() -> PathBuf {
        PathBuf::from(".")
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
