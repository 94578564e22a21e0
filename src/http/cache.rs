//! HTTP cache validation module
//!
//! `ETag` and `Last-Modified` validators for stored files, plus the
//! `If-None-Match` / `If-Modified-Since` checks. Both validators come from
//! file metadata so revalidation never reads the file.

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// IMF-fixdate, the only format servers may emit
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Quoted `ETag` from size and modification time, e.g. `"a-18bcfe5a2c1"`
pub fn generate_etag(size: u64, modified: SystemTime) -> String {
    let millis = modified
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    format!("\"{size:x}-{millis:x}\"")
}

/// Whether the client's `If-None-Match` lists this `ETag` (or `*`)
///
/// Weak validators (`W/"..."`) compare equal to their strong form.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|header| {
        header.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate.trim_start_matches("W/") == etag
        })
    })
}

/// `Last-Modified` value for a file time
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Whether the file is unchanged since the client's `If-Modified-Since`
///
/// HTTP dates have second precision, so sub-second mtimes are truncated.
/// Unparseable dates never match.
pub fn check_not_modified_since(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = if_modified_since.and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
    else {
        return false;
    };
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64, millis: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_millis(millis)
    }

    #[test]
    fn test_etag_tracks_size_and_mtime() {
        let a = generate_etag(10, at(1_700_000_000, 0));
        assert!(a.starts_with('"') && a.ends_with('"'));
        assert_eq!(a, generate_etag(10, at(1_700_000_000, 0)));
        assert_ne!(a, generate_etag(11, at(1_700_000_000, 0)));
        assert_ne!(a, generate_etag(10, at(1_700_000_000, 1)));
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"a-abc123\"";
        assert!(check_etag_match(Some("\"a-abc123\""), etag));
        assert!(check_etag_match(Some("\"zzz\", \"a-abc123\""), etag));
        assert!(check_etag_match(Some("W/\"a-abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"other\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_http_date() {
        assert_eq!(http_date(at(784_111_777, 0)), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_check_not_modified_since() {
        let modified = at(784_111_777, 400);
        let stamp = "Sun, 06 Nov 1994 08:49:37 GMT";
        assert!(check_not_modified_since(Some(stamp), modified));
        assert!(check_not_modified_since(Some("Mon, 07 Nov 1994 00:00:00 GMT"), modified));
        assert!(!check_not_modified_since(Some("Sun, 06 Nov 1994 08:49:36 GMT"), modified));
        assert!(!check_not_modified_since(Some("yesterday"), modified));
        assert!(!check_not_modified_since(None, modified));
    }
}
