// Configuration module entry point
// Loads layered configuration and holds the per-process server context

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig,
};

/// Environment variable prefix, e.g. `IMGHOST__SERVER__PORT=8080`
const ENV_PREFIX: &str = "IMGHOST";

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; environment variables override it and
    /// compiled-in defaults fill whatever neither source sets.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Self::defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Configuration built from defaults only
    pub fn default_settings() -> Result<Self, config::ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.request_timeout", 300)?
            .set_default("http.server_name", "imghost")?
            .set_default("http.enable_cors", true)?
            .set_default("storage.dir", "uploads")?
            .set_default("storage.route_prefix", "/uploads")?
            .set_default("storage.field_name", "image")?
            .set_default("storage.public_scheme", "http")
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        self.get_socket_addr().map_err(config::ConfigError::Message)?;

        if self.storage.field_name.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "storage.field_name must not be empty".to_string(),
            ));
        }
        if !self.storage.route_prefix.starts_with('/') || self.storage.route_prefix.len() < 2 {
            return Err(config::ConfigError::Message(format!(
                "storage.route_prefix must start with '/' and name a path, got '{}'",
                self.storage.route_prefix
            )));
        }
        if !matches!(
            self.logging.access_log_format.as_str(),
            "combined" | "common" | "json"
        ) {
            return Err(config::ConfigError::Message(format!(
                "Unknown access log format '{}'",
                self.logging.access_log_format
            )));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Route prefix without the trailing slash, e.g. `/uploads`
    pub fn upload_route_prefix(&self) -> &str {
        self.storage.route_prefix.trim_end_matches('/')
    }
}
