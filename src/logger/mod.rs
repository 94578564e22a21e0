//! Logger module
//!
//! Provides logging utilities for the upload server:
//! - Server lifecycle logging
//! - Access logging in combined, common or json format
//! - Upload diagnostics, warnings and errors
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;

/// Log severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    /// Parse `logging.level`; unknown values fall back to `Info`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "debug" | "trace" => Self::Debug,
            _ => Self::Info,
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        Level::parse(&config.logging.level),
    )
}

fn write(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write(level, message),
        None => match level {
            Level::Error | Level::Warn => eprintln!("{message}"),
            Level::Info => println!("{message}"),
            Level::Debug => {}
        },
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write(Level::Info, "======================================");
    write(Level::Info, "Image upload server started");
    write(Level::Info, &format!("Server listening at http://{addr}"));
    write(
        Level::Info,
        &format!("Storage directory: {}", config.storage.dir),
    );
    write(
        Level::Info,
        &format!(
            "Upload: POST /upload (field '{}'), files at {}/<name>",
            config.storage.field_name,
            config.upload_route_prefix()
        ),
    );
    write(Level::Info, &format!("Log level: {}", config.logging.level));
    if let Some(ref path) = config.logging.access_log_file {
        write(Level::Info, &format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write(Level::Info, &format!("Error log: {path}"));
    }
    write(Level::Info, "======================================\n");
}

pub fn log_shutdown() {
    write(
        Level::Info,
        "[Shutdown] No longer accepting connections, in-flight requests finish in background",
    );
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write(Level::Debug, &format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write(
        Level::Error,
        &format!("[ERROR] Failed to serve connection: {err:?}"),
    );
}

pub fn log_info(message: &str) {
    write(Level::Info, message);
}

pub fn log_debug(message: &str) {
    write(Level::Debug, &format!("[DEBUG] {message}"));
}

pub fn log_error(message: &str) {
    write(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write(Level::Warn, &format!("[WARN] {message}"));
}

pub fn log_upload_started() {
    write(Level::Info, "[Upload] Incoming upload request...");
}

pub fn log_upload_missing_file() {
    write(Level::Warn, "[Upload] No file uploaded");
}

pub fn log_upload_stored(filename: &str, size: u64) {
    write(
        Level::Info,
        &format!("[Upload] File uploaded: {filename} ({size} bytes)"),
    );
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("error"), Level::Error);
        assert_eq!(Level::parse("WARN"), Level::Warn);
        assert_eq!(Level::parse(" debug "), Level::Debug);
        assert_eq!(Level::parse("info"), Level::Info);
        assert_eq!(Level::parse("verbose"), Level::Info);
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Error < Level::Warn);
        assert!(Level::Warn < Level::Info);
        assert!(Level::Info < Level::Debug);
    }
}
