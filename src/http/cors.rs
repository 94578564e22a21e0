//! Cross-origin headers
//!
//! Every origin is allowed. Preflight requests get a 204 listing the
//! permitted methods and echoing the headers the browser asked for.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, VARY,
};
use hyper::{Response, StatusCode};

const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Add `Access-Control-Allow-Origin: *` to a response
pub fn apply_cors_headers(response: &mut Response<Full<Bytes>>) {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}

/// Build the 204 answer to an `OPTIONS` preflight
pub fn build_preflight_response(
    requested_headers: Option<&HeaderValue>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS)
        .header(VARY, "Access-Control-Request-Headers")
        .header(CONTENT_LENGTH, 0);

    if let Some(headers) = requested_headers {
        builder = builder.header(ACCESS_CONTROL_ALLOW_HEADERS, headers.clone());
    }

    let mut response = builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        crate::logger::log_error(&format!("Failed to build preflight response: {e}"));
        Response::new(Full::new(Bytes::new()))
    });
    apply_cors_headers(&mut response);
    response
}
