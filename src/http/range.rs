//! Byte range module
//!
//! Single-range `Range: bytes=...` parsing for stored file downloads.
//! Multi-range requests are answered with the whole file.

/// Inclusive byte span inside a file of known length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub first: u64,
    pub last: u64,
}

impl ByteRange {
    pub const fn length(&self) -> u64 {
        self.last - self.first + 1
    }

    /// `Content-Range` value, e.g. `bytes 0-1/10`
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{total}", self.first, self.last)
    }
}

/// What a `Range` header asks for
#[derive(Debug, PartialEq, Eq)]
pub enum RangeOutcome {
    /// Serve this slice with 206
    Partial(ByteRange),
    /// Well-formed but outside the file, answer 416
    Unsatisfiable,
    /// Absent, malformed or multi-range: serve the whole file
    Full,
}

/// Resolve a `Range` header against a file of `total` bytes
///
/// Accepts `bytes=first-last`, `bytes=first-` and `bytes=-suffix`. An end
/// past the file is clamped to the last byte.
///
/// ```
/// use imghost::http::range::{parse_range, ByteRange, RangeOutcome};
///
/// assert_eq!(
///     parse_range(Some("bytes=0-1"), 10),
///     RangeOutcome::Partial(ByteRange { first: 0, last: 1 })
/// );
/// assert_eq!(parse_range(Some("bytes=10-"), 10), RangeOutcome::Unsatisfiable);
/// assert_eq!(parse_range(None, 10), RangeOutcome::Full);
/// ```
pub fn parse_range(header: Option<&str>, total: u64) -> RangeOutcome {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };
    if spec.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };

    match (first.trim(), last.trim()) {
        ("", suffix) => suffix_range(suffix, total),
        (first, last) => bounded_range(first, last, total),
    }
}

/// `-N`: the final N bytes
fn suffix_range(suffix: &str, total: u64) -> RangeOutcome {
    let Ok(suffix) = suffix.parse::<u64>() else {
        return RangeOutcome::Full;
    };
    if suffix == 0 || total == 0 {
        return RangeOutcome::Unsatisfiable;
    }
    RangeOutcome::Partial(ByteRange {
        first: total.saturating_sub(suffix),
        last: total - 1,
    })
}

/// `N-` or `N-M`
fn bounded_range(first: &str, last: &str, total: u64) -> RangeOutcome {
    let Ok(first) = first.parse::<u64>() else {
        return RangeOutcome::Full;
    };
    let last = if last.is_empty() {
        None
    } else {
        match last.parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => return RangeOutcome::Full,
        }
    };

    if first >= total {
        return RangeOutcome::Unsatisfiable;
    }
    let last = last.map_or(total - 1, |n| n.min(total - 1));
    if first > last {
        return RangeOutcome::Unsatisfiable;
    }
    RangeOutcome::Partial(ByteRange { first, last })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(first: u64, last: u64) -> RangeOutcome {
        RangeOutcome::Partial(ByteRange { first, last })
    }

    #[test]
    fn test_bounded_and_open_ranges() {
        assert_eq!(parse_range(Some("bytes=0-1"), 10), partial(0, 1));
        assert_eq!(parse_range(Some("bytes=4-"), 10), partial(4, 9));
        assert_eq!(parse_range(Some("bytes=8-500"), 10), partial(8, 9));
        assert_eq!(parse_range(Some("bytes= 2 - 3 "), 10), partial(2, 3));
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(parse_range(Some("bytes=-3"), 10), partial(7, 9));
        assert_eq!(parse_range(Some("bytes=-50"), 10), partial(0, 9));
        assert_eq!(parse_range(Some("bytes=-0"), 10), RangeOutcome::Unsatisfiable);
    }

    #[test]
    fn test_unsatisfiable() {
        assert_eq!(parse_range(Some("bytes=10-"), 10), RangeOutcome::Unsatisfiable);
        assert_eq!(parse_range(Some("bytes=5-2"), 10), RangeOutcome::Unsatisfiable);
        assert_eq!(parse_range(Some("bytes=0-"), 0), RangeOutcome::Unsatisfiable);
        assert_eq!(parse_range(Some("bytes=-1"), 0), RangeOutcome::Unsatisfiable);
    }

    #[test]
    fn test_ignored_headers_fall_back_to_full() {
        assert_eq!(parse_range(None, 10), RangeOutcome::Full);
        assert_eq!(parse_range(Some("items=0-1"), 10), RangeOutcome::Full);
        assert_eq!(parse_range(Some("bytes=a-b"), 10), RangeOutcome::Full);
        assert_eq!(parse_range(Some("bytes=0-1,4-5"), 10), RangeOutcome::Full);
        assert_eq!(parse_range(Some("bytes=3"), 10), RangeOutcome::Full);
    }

    #[test]
    fn test_content_range() {
        let range = ByteRange { first: 0, last: 1 };
        assert_eq!(range.length(), 2);
        assert_eq!(range.content_range(10), "bytes 0-1/10");
    }
}
