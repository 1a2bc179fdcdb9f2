//! HTTP Range header parsing with lenient recovery.
//!
//! Media players send imprecise ranges while seeking, so parsing never
//! fails: malformed or out-of-bounds input is repaired to the nearest valid
//! byte interval instead of being rejected with a 416. The returned range
//! always satisfies `0 <= start <= end <= total - 1`.

/// An inclusive byte interval `[start, end]` over a file of known length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// The full-file range for a file of `total` bytes.
    ///
    /// `total` must be greater than zero.
    pub fn full(total: u64) -> Self {
        Self {
            start: 0,
            end: total - 1,
        }
    }

    /// Parse a `Range` header value against a file of `total` bytes
    /// (`total > 0`).
    ///
    /// Only the single-range `bytes=<start>-<end>` form is understood;
    /// suffix ranges and multi-ranges fall through the same numeric parse.
    /// Recovery rules, applied in order:
    ///
    /// - absent header, or unparsable `start` -> `start = 0`
    /// - omitted or unparsable `end` -> `end = total - 1`
    /// - `start >= total` -> `start = 0`
    /// - `end >= total` -> `end = total - 1`
    /// - `start > end` after the above -> `start = 0`
    pub fn parse(header: Option<&str>, total: u64) -> Self {
        let Some(value) = header else {
            return Self::full(total);
        };

        let raw = value.strip_prefix("bytes=").unwrap_or(value);
        let mut parts = raw.splitn(2, '-');

        let mut start: u64 = parts
            .next()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);
        let mut end: u64 = parts
            .next()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(total - 1);

        if start >= total {
            start = 0;
        }
        if end >= total {
            end = total - 1;
        }
        if start > end {
            start = 0;
        }

        Self { start, end }
    }

    /// Number of bytes covered by this range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// True when the range covers the whole file of `total` bytes.
    pub fn is_full(&self, total: u64) -> bool {
        self.start == 0 && self.end == total - 1
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
