//! Request handler module
//!
//! Routes requests to the health check, stored-file serving and the
//! upload endpoint.

pub mod router;
pub mod static_files;
pub mod upload;

pub use router::handle_request;
