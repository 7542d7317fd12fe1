/// A parsed `Content-Range: bytes lo-hi/total` header value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ContentRange {
    /// Start offset, inclusive.
    pub lo: u64,
    /// End offset, inclusive (per the wire format; callers typically treat
    /// the part's body as covering `[lo, hi]` inclusive, i.e. `hi - lo + 1`
    /// bytes).
    pub hi: u64,
    /// Total resource length, if the server did not send `*`.
    pub total: Option<u64>,
}

/// Parses a single `Content-Range` header value such as
/// `bytes 0-7/8` or `bytes 10-19/*`.
#[must_use]
pub fn parse(value: &str) -> Option<ContentRange> {
    let rest = value.trim().strip_prefix("bytes ")?;
    let (range, total) = rest.split_once('/')?;
    let (lo, hi) = range.split_once('-')?;

    let lo: u64 = lo.trim().parse().ok()?;
    let hi: u64 = hi.trim().parse().ok()?;
    let total = total.trim();
    let total = if total == "*" {
        None
    } else {
        Some(total.parse().ok()?)
    };

    Some(ContentRange { lo, hi, total })
}
