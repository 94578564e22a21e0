// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio runtime worker threads (default: one per core)
    ///
    /// Requests are not spread over these threads: every connection runs on
    /// the main thread's `LocalSet`. File I/O goes to Tokio's blocking pool,
    /// which this does not size.
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level written: error, warn, info or debug
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Whole-connection timeout in seconds, 0 disables it
    pub request_timeout: u64,
    #[serde(default)]
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    /// Upper bound on `Content-Length`, unlimited when unset
    #[serde(default)]
    pub max_body_size: Option<u64>,
}

/// Upload storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory uploads are written to and served from
    pub dir: String,
    /// URL prefix under which stored files are served
    pub route_prefix: String,
    /// Multipart field carrying the uploaded file
    pub field_name: String,
    /// Scheme used when building public URLs
    pub public_scheme: String,
}
