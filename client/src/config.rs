//! Configuration management for the hawker client.
//!
//! Loads configuration from environment variables with sensible defaults.

use hawker_runtime::StoreConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Base URL used when `HAWKER_API_URL` is unset
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Where the cart snapshot is kept
    pub cart_path: PathBuf,
    /// Store runtime configuration
    pub store: StoreConfig,
    /// Log filter (trace, debug, info, warn, error or an `EnvFilter` directive)
    pub log_level: String,
}

/// Backend API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Scheme, host and port of the backend
    pub base_url: String,
    /// Path prefix of the API routes
    pub api_path: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Root URL that route paths are appended to, e.g. `http://localhost:8000/api`
    #[must_use]
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.api_path.trim_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_path: "/api".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("HAWKER_API_URL").unwrap_or_else(|| {
            tracing::warn!(
                default = DEFAULT_API_URL,
                "HAWKER_API_URL not set, using default"
            );
            DEFAULT_API_URL.to_string()
        });

        let defaults = StoreConfig::default();

        Self {
            api: ApiConfig {
                base_url,
                api_path: lookup("HAWKER_API_PATH").unwrap_or_else(|| "/api".to_string()),
                request_timeout: Duration::from_secs(
                    lookup("HAWKER_REQUEST_TIMEOUT_SECS")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(30),
                ),
            },
            cart_path: lookup("HAWKER_CART_PATH")
                .map_or_else(|| PathBuf::from("cart.json"), PathBuf::from),
            store: StoreConfig::new(
                lookup("HAWKER_BROADCAST_CAPACITY")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.broadcast_capacity),
                Duration::from_secs(
                    lookup("HAWKER_SHUTDOWN_TIMEOUT_SECS")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(5),
                ),
            ),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Tracing filter built from `log_level`
    ///
    /// An unparsable directive falls back to `info`.
    #[must_use]
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}
