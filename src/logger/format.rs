//! Access log format module
//!
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format)
//! - `json` (one JSON object per line)

use chrono::{DateTime, Local};
use serde_json::json;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One served request
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry stamped with the current time
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Render using `combined`, `common` or `json`; anything else is `combined`
    pub fn format(&self, format: &str) -> String {
        match format {
            "common" => self.format_common(),
            "json" => self.format_json(),
            _ => self.format_combined(),
        }
    }

    fn request_line(&self) -> String {
        let query = self
            .query
            .as_ref()
            .map(|q| format!("?{q}"))
            .unwrap_or_default();
        format!(
            "{} {}{} HTTP/{}",
            self.method, self.path, query, self.http_version
        )
    }

    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\"",
            self.format_common(),
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    fn format_json(&self) -> String {
        json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "10.0.0.7:51234".to_string(),
            "POST".to_string(),
            "/upload".to_string(),
        );
        entry.status = 200;
        entry.body_bytes = 87;
        entry.user_agent = Some("curl/8.5.0".to_string());
        entry.request_time_us = 2300;
        entry
    }

    #[test]
    fn test_format_combined() {
        let log = upload_entry().format("combined");
        assert!(log.starts_with("10.0.0.7:51234 - - ["));
        assert!(log.contains("\"POST /upload HTTP/1.1\" 200 87"));
        assert!(log.ends_with("\"-\" \"curl/8.5.0\""));
    }

    #[test]
    fn test_format_common_omits_agent() {
        let mut entry = upload_entry();
        entry.query = Some("v=1".to_string());
        let log = entry.format("common");
        assert!(log.contains("\"POST /upload?v=1 HTTP/1.1\" 200 87"));
        assert!(!log.contains("curl"));
    }

    #[test]
    fn test_format_json_is_valid_json() {
        let mut entry = upload_entry();
        entry.path = "/uploads/\"quoted\".png".to_string();
        let log = entry.format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["status"], 200);
        assert_eq!(value["path"], "/uploads/\"quoted\".png");
        assert!(value["referer"].is_null());
    }

    #[test]
    fn test_unknown_format_falls_back_to_combined() {
        let entry = upload_entry();
        assert_eq!(entry.format("whatever"), entry.format("combined"));
    }
}
