//! Application State
//!
//! Shared state accessible by all API handlers.

use crate::adapter::MetricsAdapter;
use crate::store::RecordStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Adapter over the configured record store
    pub adapter: MetricsAdapter<dyn RecordStore>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(adapter: MetricsAdapter<dyn RecordStore>, config: ApiConfig) -> Self {
        Self {
            adapter,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins; empty allows any
    pub cors_origins: Vec<String>,
    /// Days of history when the request does not say
    pub history_days: usize,
    /// Upper bound on requested history
    pub max_history_days: usize,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            cors_origins: Vec::new(),
            history_days: 7,
            max_history_days: 366,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Build from the file/env configuration
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            host: config.api.host.clone(),
            port: config.api.port,
            cors_origins: config.api.cors_origins.clone(),
            history_days: config.dashboard.history_days,
            request_timeout: Duration::from_secs(config.api.request_timeout_secs),
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
