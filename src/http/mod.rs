//! HTTP protocol layer module
//!
//! Response builders, MIME detection, cache validators, byte ranges and
//! CORS headers, kept apart from routing and upload logic.

pub mod cache;
pub mod cors;
pub mod mime;
pub mod range;
pub mod response;

pub use cors::{apply_cors_headers, build_preflight_response};
pub use range::{parse_range, RangeOutcome};
pub use response::{
    build_304_response, build_404_response, build_413_response, build_416_response,
    build_file_response, build_json_response, build_partial_response, build_text_response,
    FileHeaders,
};
