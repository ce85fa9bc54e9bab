//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::middleware::cors::DEFAULT_MAX_AGE_SECS;
use crate::routing::router::{DEFAULT_POOL_INITIAL_SIZE, DEFAULT_POOL_MAX_SIZE};

/// Root configuration for the server binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Parameter pool sizing for every router.
    pub pool: PoolConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Response header decorators.
    pub headers: HeadersConfig,

    /// Static file mount.
    pub static_files: StaticFilesConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Parameter pool sizing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Lists allocated up front.
    pub initial_size: usize,

    /// Lists retained at most; extra returns are dropped.
    pub max_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: DEFAULT_POOL_INITIAL_SIZE,
            max_size: DEFAULT_POOL_MAX_SIZE,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,

    /// Emit one log line per served request.
    pub request_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            request_logging: true,
        }
    }
}

/// Response header decorators.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HeadersConfig {
    /// Add `Cache-Control: no-cache` to every response.
    pub no_cache: bool,

    pub cors: CorsConfig,
}

/// CORS settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,

    /// Answer `OPTIONS` preflight requests.
    pub preflight: bool,

    pub allowed_methods: Vec<String>,

    pub allowed_headers: Vec<String>,

    /// Preflight cache lifetime, in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            preflight: false,
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: vec!["Content-Type".to_string()],
            max_age_secs: DEFAULT_MAX_AGE_SECS,
        }
    }
}

/// Static file mount.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub enabled: bool,

    /// Directory files are served from.
    pub root: String,

    /// Cascade prefix the files are mounted under; empty mounts them as
    /// the main target.
    pub prefix: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            root: "./public".to_string(),
            prefix: "/static".to_string(),
        }
    }
}
