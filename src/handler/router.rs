//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method and path matching,
//! the optional body size guard, CORS and `Server` headers, access logging.

use crate::config::AppState;
use crate::handler::{static_files, upload};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, ACCESS_CONTROL_REQUEST_HEADERS, SERVER};
use hyper::{Method, Request, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Path the upload form posts to
pub const UPLOAD_PATH: &str = "/upload";

/// Liveness text served at `/`
pub const HEALTH_BODY: &str = "🚀 Server is running...";

/// Request details needed after the request itself has been consumed
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range: Option<String>,
}

impl RequestContext {
    fn from_request<B>(req: &Request<B>) -> Self {
        let method = req.method().clone();
        Self {
            is_head: method == Method::HEAD,
            method,
            path: req.uri().path().to_string(),
            if_none_match: header_string(req, "if-none-match"),
            if_modified_since: header_string(req, "if-modified-since"),
            range: header_string(req, "range"),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let started = Instant::now();
    let access_log = state.config.logging.access_log.then(|| {
        let mut entry = AccessLogEntry::new(
            remote_addr.to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = version_label(req.version()).to_string();
        entry.referer = header_string(&req, "referer");
        entry.user_agent = header_string(&req, "user-agent");
        entry
    });

    let mut response = route_request(req, &state).await;

    if state.config.http.enable_cors {
        http::apply_cors_headers(&mut response);
    }
    if let Ok(name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, name);
    }

    if let Some(mut entry) = access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response_size(&response);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on method and path
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let ctx = RequestContext::from_request(&req);
    let prefix = state.config.upload_route_prefix();

    match ctx.method {
        Method::OPTIONS if state.config.http.enable_cors => {
            http::build_preflight_response(req.headers().get(ACCESS_CONTROL_REQUEST_HEADERS))
        }
        Method::GET | Method::HEAD if ctx.path == "/" => {
            http::build_text_response(StatusCode::OK, HEALTH_BODY, ctx.is_head)
        }
        Method::GET | Method::HEAD => match stored_name(&ctx.path, prefix) {
            Some(name) => static_files::serve_upload(&ctx, &state.storage, name).await,
            None => http::build_404_response(),
        },
        Method::POST if is_route(&ctx.path, UPLOAD_PATH) => {
            if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
                return resp;
            }
            upload::handle_upload(req, state).await
        }
        _ => {
            logger::log_debug(&format!("No route for {} {}", ctx.method, ctx.path));
            http::build_404_response()
        }
    }
}

/// Exact route match that also accepts one trailing slash
fn is_route(path: &str, route: &str) -> bool {
    path == route || path.strip_suffix('/') == Some(route)
}

/// Name requested under the upload prefix, e.g. `/uploads/1-2.png` -> `1-2.png`
fn stored_name<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    path.strip_prefix(prefix)?
        .strip_prefix('/')
        .filter(|name| !name.is_empty())
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: Option<u64>) -> Option<Response<Full<Bytes>>> {
    let max_body_size = max_body_size?;
    let size_str = req.headers().get("content-length")?.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Ok(_) => None,
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
    }
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn response_size(response: &Response<Full<Bytes>>) -> usize {
    response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
