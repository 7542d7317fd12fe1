/// Formats a list of `[lo, hi)` byte ranges into an HTTP `Range:` header
/// value, e.g. `bytes=0-7,10-19`.
///
/// zsync's missing ranges are half-open; the HTTP `byte-range-spec` wants
/// an inclusive last-byte position, so each range's upper bound is
/// expressed as `hi - 1`.
#[must_use]
pub fn format_range_header(ranges: &[(u64, u64)]) -> String {
    let specs: Vec<String> = ranges
        .iter()
        .map(|&(lo, hi)| format!("{lo}-{}", hi.saturating_sub(1)))
        .collect();
    format!("bytes={}", specs.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_single_range() {
        assert_eq!(format_range_header(&[(0, 8)]), "bytes=0-7");
    }

    #[test]
    fn formats_multiple_ranges_comma_separated() {
        assert_eq!(
            format_range_header(&[(0, 4), (10, 20)]),
            "bytes=0-3,10-19"
        );
    }
}
