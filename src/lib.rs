//! imghost: a small image upload server.
//!
//! `POST /upload` stores the multipart `image` part under a generated name,
//! `GET /uploads/<name>` serves it back, `GET /` answers liveness checks.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod storage;
