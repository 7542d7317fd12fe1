use rustc_hash::FxHashMap;

use crate::content_range::{self, ContentRange};
use crate::error::FetchError;

fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut positions = Vec::new();
    if needle.is_empty() || haystack.len() < needle.len() {
        return positions;
    }
    let mut start = 0;
    while start + needle.len() <= haystack.len() {
        if &haystack[start..start + needle.len()] == needle {
            positions.push(start);
            start += needle.len();
        } else {
            start += 1;
        }
    }
    positions
}

fn trim_leading_newline(chunk: &[u8]) -> &[u8] {
    chunk
        .strip_prefix(b"\r\n")
        .or_else(|| chunk.strip_prefix(b"\n"))
        .unwrap_or(chunk)
}

fn trim_trailing_newline(chunk: &[u8]) -> &[u8] {
    chunk
        .strip_suffix(b"\r\n")
        .or_else(|| chunk.strip_suffix(b"\n"))
        .unwrap_or(chunk)
}

fn split_headers_body(chunk: &[u8]) -> Option<(&[u8], &[u8])> {
    let positions_crlf = find_all(chunk, b"\r\n\r\n");
    if let Some(&at) = positions_crlf.first() {
        return Some((&chunk[..at], &chunk[at + 4..]));
    }
    let positions_lf = find_all(chunk, b"\n\n");
    positions_lf
        .first()
        .map(|&at| (&chunk[..at], &chunk[at + 2..]))
}

fn parse_header_lines(blob: &[u8]) -> FxHashMap<String, String> {
    let text = String::from_utf8_lossy(blob);
    let mut headers = FxHashMap::default();
    for line in text.split(['\n']) {
        let line = line.trim_end_matches('\r');
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    headers
}

/// Parses a `multipart/byteranges` response body into its constituent
/// parts, each with its own [`ContentRange`] and body bytes.
///
/// Tolerates both CRLF and bare-LF line endings, since the reference
/// implementation does not guarantee either.
///
/// # Errors
///
/// Returns [`FetchError::MalformedResponse`] if no boundary delimiters are
/// found, or if a part is missing its header/body separator or its
/// `Content-Range` header.
pub fn parse_byteranges(
    body: &[u8],
    boundary: &str,
) -> Result<Vec<(ContentRange, Vec<u8>)>, FetchError> {
    let delim = format!("--{boundary}");
    let delim = delim.as_bytes();
    let positions = find_all(body, delim);
    if positions.len() < 2 {
        return Err(FetchError::MalformedResponse {
            reason: "no multipart boundaries found".to_string(),
        });
    }

    let mut parts = Vec::new();
    for window in positions.windows(2) {
        let start = window[0] + delim.len();
        let end = window[1];
        let chunk = trim_leading_newline(&body[start..end]);
        if chunk.starts_with(b"--") {
            continue;
        }

        let (headers_blob, body_blob) = split_headers_body(chunk).ok_or_else(|| {
            FetchError::MalformedResponse {
                reason: "missing header/body separator in multipart part".to_string(),
            }
        })?;

        let headers = parse_header_lines(headers_blob);
        let content_range = headers
            .get("content-range")
            .and_then(|v| content_range::parse(v))
            .ok_or_else(|| FetchError::MalformedResponse {
                reason: "multipart part missing Content-Range".to_string(),
            })?;

        parts.push((content_range, trim_trailing_newline(body_blob).to_vec()));
    }

    Ok(parts)
}
