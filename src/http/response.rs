//! HTTP response building module
//!
//! Builders for the handful of responses the server emits.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::range::ByteRange;

/// Stored files are immutable, but clients still revalidate via `ETag`
const FILE_CACHE_CONTROL: &str = "public, max-age=0";

/// Validators and type sent with every stored-file response
pub struct FileHeaders<'a> {
    pub content_type: &'a str,
    pub etag: &'a str,
    pub last_modified: &'a str,
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, last_modified: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", etag)
        .header("Last-Modified", last_modified)
        .header("Cache-Control", FILE_CACHE_CONTROL)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 Not Found")))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        &serde_json::json!({ "error": "Payload too large" }),
    )
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(total_size: u64) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{total_size}"))
        .header("Accept-Ranges", "bytes")
        .body(Full::new(Bytes::from("Range Not Satisfiable")))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(Full::new(Bytes::from("Range Not Satisfiable")))
        })
}

/// Build a short text response; `is_head` keeps the length but drops the body
pub fn build_text_response(
    status: StatusCode,
    text: &'static str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from_static(text.as_bytes())
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", text.len())
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from_static(text.as_bytes())))
        })
}

/// Build JSON response
pub fn build_json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from_static(
                    br#"{"error":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))));
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .header("Content-Length", json.len())
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// Build 200 response for a stored file
///
/// `body` is empty for HEAD; `content_length` is always the file size.
pub fn build_file_response(
    body: Bytes,
    content_length: u64,
    file: &FileHeaders<'_>,
) -> Response<Full<Bytes>> {
    file_response_builder(StatusCode::OK, content_length, file)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 206 Partial Content response for one byte range of a stored file
pub fn build_partial_response(
    body: Bytes,
    range: ByteRange,
    total_size: u64,
    file: &FileHeaders<'_>,
) -> Response<Full<Bytes>> {
    file_response_builder(StatusCode::PARTIAL_CONTENT, range.length(), file)
        .header("Content-Range", range.content_range(total_size))
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

fn file_response_builder(
    status: StatusCode,
    content_length: u64,
    file: &FileHeaders<'_>,
) -> hyper::http::response::Builder {
    Response::builder()
        .status(status)
        .header("Content-Type", file.content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", file.etag)
        .header("Last-Modified", file.last_modified)
        .header("Cache-Control", FILE_CACHE_CONTROL)
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
