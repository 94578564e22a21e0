//! MIME type detection module
//!
//! Maps a stored file's extension to the `Content-Type` it is served with.

/// Get MIME Content-Type based on file extension (case-insensitive)
///
/// # Examples
/// ```
/// use imghost::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("png")), "image/png");
/// assert_eq!(get_content_type(Some("JPG")), "image/jpeg");
/// assert_eq!(get_content_type(None), "application/octet-stream");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    let Some(ext) = extension else {
        return "application/octet-stream";
    };

    match ext.to_ascii_lowercase().as_str() {
        // Images
        "png" => "image/png",
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "heif" => "image/heif",

        // Anything else an upload may carry
        "txt" => "text/plain; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "zip" => "application/zip",

        _ => "application/octet-stream",
    }
}
