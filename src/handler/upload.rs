//! Upload endpoint
//!
//! Streams the single file part of a multipart form into the storage
//! directory and answers with the URL it will be served from.

use crate::config::{AppState, Config};
use crate::http;
use crate::logger;
use crate::storage::Storage;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_TYPE, HOST};
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum UploadError {
    /// No file part under the expected field name (or not multipart at all)
    #[error("No file uploaded")]
    NoFile,
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),
    #[error("Failed to store file: {0}")]
    Storage(#[from] std::io::Error),
}

impl UploadError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NoFile | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client; I/O details stay in the log
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) => "Failed to store file".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    #[serde(rename = "imageUrl")]
    image_url: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// A file written to storage
#[derive(Debug)]
pub struct StoredUpload {
    pub filename: String,
    pub size: u64,
}

/// Handle `POST /upload`
pub async fn handle_upload<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    logger::log_upload_started();
    let host = request_host(&req, &state.config);

    match receive_upload(req, &state.storage, &state.config.storage.field_name).await {
        Ok(stored) => {
            logger::log_upload_stored(&stored.filename, stored.size);
            let body = UploadResponse {
                image_url: public_url(&state.config, &host, &stored.filename),
            };
            http::build_json_response(StatusCode::OK, &body)
        }
        Err(err) => {
            match &err {
                UploadError::NoFile => logger::log_upload_missing_file(),
                UploadError::Multipart(e) => {
                    logger::log_warning(&format!("[Upload] Rejected multipart body: {e}"));
                }
                UploadError::Storage(e) => {
                    logger::log_error(&format!("[Upload] Failed to store file: {e}"));
                }
            }
            let body = ErrorResponse {
                error: err.user_message(),
            };
            http::build_json_response(err.status_code(), &body)
        }
    }
}

/// Parse the form and persist the first file part named `field_name`
///
/// Other parts are skipped. If the body turns out to be broken after the
/// file was written, the file is removed again.
pub async fn receive_upload<B>(
    req: Request<B>,
    storage: &Storage,
    field_name: &str,
) -> Result<StoredUpload, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let Some(boundary) = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
    else {
        return Err(UploadError::NoFile);
    };

    let mut multipart = multer::Multipart::new(req.into_body().into_data_stream(), boundary);
    let mut stored: Option<StoredUpload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                if let Some(upload) = &stored {
                    storage.remove(&upload.filename).await;
                }
                return Err(e.into());
            }
        };

        if stored.is_some() || field.name() != Some(field_name) {
            continue;
        }
        let Some(original_name) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        stored = Some(write_field(field, &original_name, storage).await?);
    }

    stored.ok_or(UploadError::NoFile)
}

async fn write_field(
    mut field: multer::Field<'_>,
    original_name: &str,
    storage: &Storage,
) -> Result<StoredUpload, UploadError> {
    let (filename, mut file) = storage.create(original_name).await?;

    let mut size = 0u64;
    let copied = async {
        while let Some(chunk) = field.chunk().await? {
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        file.flush().await?;
        Ok::<(), UploadError>(())
    }
    .await;
    drop(file);

    match copied {
        Ok(()) => Ok(StoredUpload { filename, size }),
        Err(e) => {
            storage.remove(&filename).await;
            Err(e)
        }
    }
}

/// Host the client addressed, taken verbatim from the `Host` header
fn request_host<B>(req: &Request<B>, config: &Config) -> String {
    req.headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .or_else(|| req.uri().authority().map(ToString::to_string))
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port))
}

fn public_url(config: &Config, host: &str, filename: &str) -> String {
    format!(
        "{}://{}{}/{}",
        config.storage.public_scheme,
        host,
        config.upload_route_prefix(),
        urlencoding::encode(filename)
    )
}
