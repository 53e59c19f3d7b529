//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::adapter::AdapterConfig;
use crate::projections::{NutritionGoals, PlaceholderPolicy};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which record store backs the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Remote OData-style REST store
    Http,
    /// In-process store seeded with sample days
    Memory,
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_kind")]
    pub kind: StoreKind,

    #[serde(default = "default_store_url")]
    pub url: String,

    #[serde(default = "default_entity_set")]
    pub entity_set: String,

    #[serde(default = "default_column_prefix")]
    pub column_prefix: String,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_store_timeout")]
    pub request_timeout_ms: u64,

    /// Days of sample data for the memory store
    #[serde(default = "default_sample_days")]
    pub sample_days: usize,
}

fn default_store_kind() -> StoreKind {
    StoreKind::Http
}

fn default_store_url() -> String {
    "http://localhost:8080/api/data/v9.2".to_string()
}

fn default_entity_set() -> String {
    "cr1d7_healthmetrics".to_string()
}

fn default_column_prefix() -> String {
    "cr1d7_".to_string()
}

fn default_store_timeout() -> u64 {
    10_000 // 10 seconds
}

fn default_sample_days() -> usize {
    14
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: default_store_kind(),
            url: default_store_url(),
            entity_set: default_entity_set(),
            column_prefix: default_column_prefix(),
            token: None,
            request_timeout_ms: default_store_timeout(),
            sample_days: default_sample_days(),
        }
    }
}

/// How placeholders are filled for metrics the store lacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderMode {
    Unavailable,
    Simulated,
}

/// Dashboard behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_today_rows")]
    pub today_rows: usize,

    #[serde(default = "default_history_days")]
    pub history_days: usize,

    #[serde(default = "default_request_order")]
    pub request_order: bool,

    #[serde(default = "default_placeholders")]
    pub placeholders: PlaceholderMode,

    #[serde(default)]
    pub placeholder_seed: Option<u64>,

    #[serde(default)]
    pub goals: NutritionGoals,
}

fn default_today_rows() -> usize {
    10
}

fn default_history_days() -> usize {
    7
}

fn default_request_order() -> bool {
    true
}

fn default_placeholders() -> PlaceholderMode {
    PlaceholderMode::Unavailable
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            today_rows: default_today_rows(),
            history_days: default_history_days(),
            request_order: default_request_order(),
            placeholders: default_placeholders(),
            placeholder_seed: None,
            goals: NutritionGoals::default(),
        }
    }
}

impl DashboardConfig {
    /// Placeholder policy described by this configuration
    pub fn placeholder_policy(&self) -> PlaceholderPolicy {
        match self.placeholders {
            PlaceholderMode::Unavailable => PlaceholderPolicy::Unavailable,
            PlaceholderMode::Simulated => PlaceholderPolicy::Simulated {
                seed: self.placeholder_seed,
            },
        }
    }

    /// Adapter settings described by this configuration
    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            today_rows: self.today_rows,
            placeholders: self.placeholder_policy(),
            request_order: self.request_order,
            goals: self.goals,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let loaded = Self::discover();
        loaded.log();
        loaded.config
    }

    /// Standard config file locations, highest priority first
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("pulseboard").join("config.toml")),
            Some(PathBuf::from("/etc/pulseboard/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Search the standard locations without logging
    ///
    /// Callers that install their subscriber from the loaded config log the
    /// outcome afterwards with [`LoadedConfig::log`].
    pub fn discover() -> LoadedConfig {
        Self::discover_in(&Self::default_paths(), |key| std::env::var(key).ok())
    }

    /// Load the first readable file among `paths`, recording files skipped on error
    fn discover_in(paths: &[PathBuf], lookup: impl Fn(&str) -> Option<String>) -> LoadedConfig {
        let mut skipped = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load(path) {
                Ok(mut config) => {
                    config.apply_overrides(&lookup);
                    return LoadedConfig {
                        config,
                        source: Some(path.clone()),
                        skipped,
                    };
                }
                Err(e) => skipped.push(e),
            }
        }

        let mut config = Config::default();
        config.apply_overrides(&lookup);
        LoadedConfig {
            config,
            source: None,
            skipped,
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (environment in production)
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Store overrides
        if let Some(kind) = lookup("PULSEBOARD_STORE_KIND") {
            match kind.to_lowercase().as_str() {
                "http" => self.store.kind = StoreKind::Http,
                "memory" => self.store.kind = StoreKind::Memory,
                other => tracing::warn!("Ignoring unknown PULSEBOARD_STORE_KIND: {}", other),
            }
        }
        if let Some(url) = lookup("PULSEBOARD_STORE_URL") {
            self.store.url = url;
        }
        if let Some(entity) = lookup("PULSEBOARD_STORE_ENTITY") {
            self.store.entity_set = entity;
        }
        if let Some(prefix) = lookup("PULSEBOARD_STORE_PREFIX") {
            self.store.column_prefix = prefix;
        }
        if let Some(token) = lookup("PULSEBOARD_STORE_TOKEN") {
            self.store.token = Some(token);
        }

        // Dashboard overrides
        if let Some(seed) = lookup("PULSEBOARD_PLACEHOLDER_SEED") {
            if let Ok(s) = seed.parse() {
                self.dashboard.placeholders = PlaceholderMode::Simulated;
                self.dashboard.placeholder_seed = Some(s);
            }
        }

        // API overrides
        if let Some(host) = lookup("PULSEBOARD_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("PULSEBOARD_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("PULSEBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PULSEBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Outcome of searching the standard config locations
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the config came from; `None` means defaults plus environment
    pub source: Option<PathBuf>,
    /// Files that existed but could not be loaded
    pub skipped: Vec<ConfigError>,
}

impl LoadedConfig {
    /// Report where the config came from and which files were skipped
    pub fn log(&self) {
        for error in &self.skipped {
            tracing::warn!("Skipping config file: {}", error);
        }
        match &self.source {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::info!("Using default config with environment overrides"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Pulseboard Configuration
#
# Environment variables override these settings:
# - PULSEBOARD_STORE_KIND
# - PULSEBOARD_STORE_URL
# - PULSEBOARD_STORE_ENTITY
# - PULSEBOARD_STORE_PREFIX
# - PULSEBOARD_STORE_TOKEN
# - PULSEBOARD_PLACEHOLDER_SEED
# - PULSEBOARD_API_HOST
# - PULSEBOARD_API_PORT
# - PULSEBOARD_LOG_LEVEL
# - PULSEBOARD_LOG_FORMAT

[store]
# Store backend: http (remote table) or memory (sample data)
kind = "http"

# Base URL of the data API
url = "http://localhost:8080/api/data/v9.2"

# Table holding one health record per day
entity_set = "cr1d7_healthmetrics"

# Tenant prefix on every column name
column_prefix = "cr1d7_"

# Bearer token (optional)
# token = ""

# Request timeout in milliseconds
request_timeout_ms = 10000

# Days of sample data when kind = "memory"
sample_days = 14

[dashboard]
# Rows scanned when looking for today's record
today_rows = 10

# Default days of history for charts
history_days = 7

# Request date-descending rows explicitly
request_order = true

# Metrics not in the store yet: unavailable or simulated
placeholders = "unavailable"

# Seed for simulated placeholders (optional)
# placeholder_seed = 42

[dashboard.goals]
calories = 2200
protein = 160
carbs = 275
fats = 73

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

# Allowed CORS origins
cors_origins = ["http://localhost:5173", "http://127.0.0.1:5173"]

# Request timeout in seconds
request_timeout_secs = 30

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
