use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::workflow::guard::DEFAULT_MAX_RETRIES;

/// Main configuration structure for the review service
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Where workflow state lives
    pub store: StoreConfig,
    /// Concurrency guard settings
    pub guard: GuardConfig,
    /// Notification hand-off settings
    pub notifications: NotificationConfig,
    /// Actor ids that fill each role, in preference order, keyed by role name
    pub directory: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    File,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory for the file backend
    pub directory: PathBuf,
    /// Connection string for the sqlite backend
    pub database_url: String,
    /// Run migrations on connect
    pub auto_migrate: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            directory: PathBuf::from(".inspection-review/submissions"),
            database_url: "sqlite://.inspection-review/review.db".to_string(),
            auto_migrate: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Stale-write retries absorbed before giving up
    pub max_retries: u32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Forward newly activated stages to the dispatcher
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ReviewConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (inspection-review.toml, .inspection-review-rc)
    /// 3. Environment variables (prefixed with INSPECTION_REVIEW_)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("inspection-review.toml").exists() {
            builder = builder.add_source(File::with_name("inspection-review"));
        }

        if Path::new(".inspection-review-rc").exists() {
            builder = builder.add_source(
                File::with_name(".inspection-review-rc").format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("INSPECTION_REVIEW")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<ReviewConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = ReviewConfig::load_env_file();
        ReviewConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static ReviewConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
