//! Stored file serving module
//!
//! Serves files from the upload directory with `ETag` / `Last-Modified`
//! revalidation and single byte ranges. Validators come from file metadata;
//! only the bytes actually sent are read.

use crate::handler::router::RequestContext;
use crate::http::range::ByteRange;
use crate::http::{self, cache, mime, FileHeaders, RangeOutcome};
use crate::logger;
use crate::storage::Storage;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io::{self, SeekFrom};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Serve one stored file by its (still percent-encoded) name
pub async fn serve_upload(
    ctx: &RequestContext,
    storage: &Storage,
    raw_name: &str,
) -> Response<Full<Bytes>> {
    let Ok(name) = urlencoding::decode(raw_name) else {
        return http::build_404_response();
    };

    let Some(path) = storage.resolve(&name) else {
        // Unknown names and traversal attempts look the same to the client
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
        }
        return http::build_404_response();
    };

    let metadata = match fs::metadata(&path).await {
        Ok(m) => m,
        Err(e) => {
            logger::log_error(&format!("Failed to stat file '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };
    let total_size = metadata.len();
    let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
    let etag = cache::generate_etag(total_size, modified);
    let last_modified = cache::http_date(modified);

    // If-None-Match wins; If-Modified-Since only counts without it
    let fresh = if ctx.if_none_match.is_some() {
        cache::check_etag_match(ctx.if_none_match.as_deref(), &etag)
    } else {
        cache::check_not_modified_since(ctx.if_modified_since.as_deref(), modified)
    };
    if fresh {
        return http::build_304_response(&etag, &last_modified);
    }

    let file = FileHeaders {
        content_type: mime::get_content_type(path.extension().and_then(|e| e.to_str())),
        etag: &etag,
        last_modified: &last_modified,
    };

    let result = match http::parse_range(ctx.range.as_deref(), total_size) {
        RangeOutcome::Unsatisfiable => return http::build_416_response(total_size),
        RangeOutcome::Partial(range) => {
            let body = if ctx.is_head {
                Ok(Bytes::new())
            } else {
                read_range(&path, range).await
            };
            body.map(|b| http::build_partial_response(b, range, total_size, &file))
        }
        RangeOutcome::Full => {
            let body = if ctx.is_head {
                Ok(Bytes::new())
            } else {
                fs::read(&path).await.map(Bytes::from)
            };
            body.map(|b| http::build_file_response(b, total_size, &file))
        }
    };

    result.unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
        http::build_404_response()
    })
}

/// Read exactly the bytes of `range`
async fn read_range(path: &Path, range: ByteRange) -> io::Result<Bytes> {
    let len = usize::try_from(range.length()).map_err(io::Error::other)?;
    let mut file = fs::File::open(path).await?;
    file.seek(SeekFrom::Start(range.first)).await?;
    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf).await?;
    Ok(Bytes::from(buf))
}
