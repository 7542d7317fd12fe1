use rustc_hash::FxHashMap;

use crate::auth::{Credentials, HostAuthCache};
use crate::content_range;
use crate::error::FetchError;
use crate::multipart;
use crate::range_header::format_range_header;
use crate::transport::{HttpTransport, RawResponse};

fn extract_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let part = part.trim();
        part.strip_prefix("boundary=")
            .map(|b| b.trim_matches('"').to_string())
    })
}

/// Drives a single ranged HTTP fetch for the target's missing byte ranges,
/// routing the recovered bytes into an [`writer::OutputFileWriter`].
pub struct RangeFetcher<T> {
    transport: T,
    auth_cache: HostAuthCache,
    credentials: FxHashMap<String, Credentials>,
}

impl<T: HttpTransport> RangeFetcher<T> {
    /// Builds a fetcher with no configured credentials.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            auth_cache: HostAuthCache::new(),
            credentials: FxHashMap::default(),
        }
    }

    /// Builds a fetcher with a host-to-credentials map for answering Basic
    /// auth challenges.
    #[must_use]
    pub fn with_credentials(transport: T, credentials: FxHashMap<String, Credentials>) -> Self {
        Self {
            transport,
            auth_cache: HostAuthCache::new(),
            credentials,
        }
    }

    /// Fetches every byte range in `ranges` with a single GET request and
    /// writes the recovered bytes into `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnexpectedStatus`] for any response status
    /// other than 200/206, [`FetchError::MalformedResponse`] if a 206
    /// response's framing cannot be parsed, and propagates transport and
    /// writer errors.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, writer)))]
    pub fn fetch_missing(
        &mut self,
        url: &str,
        ranges: &[(u64, u64)],
        writer: &mut writer::OutputFileWriter,
    ) -> Result<(), FetchError> {
        if ranges.is_empty() {
            return Ok(());
        }

        let parsed = url::Url::parse(url).map_err(|err| FetchError::MalformedResponse {
            reason: format!("invalid target URL: {err}"),
        })?;
        let scheme = parsed.scheme().to_string();
        let host = parsed.host_str().unwrap_or_default().to_string();

        let range_header = format_range_header(ranges);

        let preemptive = self
            .auth_cache
            .should_send_preemptively(&scheme, &host)
            .then(|| self.credentials.get(&host).map(Credentials::to_header_value))
            .flatten();

        let mut response = self.transport.get(url, Some(&range_header), preemptive.as_deref())?;

        if response.status == 401 {
            if let Some(creds) = self.credentials.get(&host).cloned() {
                let header = creds.to_header_value();
                response = self.transport.get(url, Some(&range_header), Some(&header))?;
                if response.status != 401 {
                    self.auth_cache.record_success(&host);
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(status = response.status, "range fetch response");

        self.route_response(response, writer)
    }

    fn route_response(
        &self,
        response: RawResponse,
        writer: &mut writer::OutputFileWriter,
    ) -> Result<(), FetchError> {
        match response.status {
            200 => {
                writer.write_range(0, &response.body)?;
                Ok(())
            }
            206 => {
                let is_multipart = response
                    .content_type
                    .as_deref()
                    .is_some_and(|ct| ct.contains("multipart/byteranges"));

                if is_multipart {
                    let boundary = response
                        .content_type
                        .as_deref()
                        .and_then(extract_boundary)
                        .ok_or_else(|| FetchError::MalformedResponse {
                            reason: "multipart response missing boundary".to_string(),
                        })?;
                    for (range, bytes) in multipart::parse_byteranges(&response.body, &boundary)? {
                        writer.write_range(range.lo, &bytes)?;
                    }
                } else {
                    let range = response
                        .content_range
                        .as_deref()
                        .and_then(content_range::parse)
                        .ok_or_else(|| FetchError::MalformedResponse {
                            reason: "206 response missing Content-Range".to_string(),
                        })?;
                    writer.write_range(range.lo, &response.body)?;
                }
                Ok(())
            }
            code => Err(FetchError::UnexpectedStatus { code }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use control::{BlockEntry, ControlFile, SequenceMatch, WholeFileDigest};
    use std::collections::VecDeque;

    struct FakeTransport {
        responses: VecDeque<RawResponse>,
        pub requests: Vec<(String, Option<String>)>,
    }

    impl FakeTransport {
        fn new(responses: Vec<RawResponse>) -> Self {
            Self {
                responses: responses.into(),
                requests: Vec::new(),
            }
        }
    }

    impl HttpTransport for FakeTransport {
        fn get(
            &mut self,
            url: &str,
            range_header: Option<&str>,
            authorization: Option<&str>,
        ) -> Result<RawResponse, FetchError> {
            self.requests
                .push((url.to_string(), authorization.map(ToString::to_string)));
            let _ = range_header;
            self.responses
                .pop_front()
                .ok_or_else(|| FetchError::MalformedResponse {
                    reason: "fake transport exhausted".to_string(),
                })
        }
    }

    fn control_for(target: &[u8], block_size: u32) -> ControlFile {
        let blocks: Vec<BlockEntry> = target
            .chunks(block_size as usize)
            .map(|chunk| {
                let mut padded = chunk.to_vec();
                padded.resize(block_size as usize, 0);
                BlockEntry {
                    weak: 0,
                    strong: checksums::strong::TruncatedMd4::new(3).digest(&padded),
                }
            })
            .collect();
        let whole = checksums::strong::Md4::digest(target);
        ControlFile {
            zsync_version: "0.6.2".to_string(),
            producer: None,
            filename: "target".to_string(),
            url: "http://example.com/target".to_string(),
            length: target.len() as u64,
            blocksize: block_size,
            sequence_match: SequenceMatch::Single,
            weak_len: 4,
            strong_len: 3,
            whole_file_digest: WholeFileDigest::Md4(whole),
            mtime: None,
            blocks,
        }
    }

    #[test]
    fn fetch_missing_no_ranges_is_noop() {
        let target = b"ABCDEFGH";
        let control = control_for(target, 4);
        let dir = tempfile::tempdir().unwrap();
        let mut writer = writer::OutputFileWriter::create(&control, dir.path().join("o")).unwrap();

        let mut fetcher = RangeFetcher::new(FakeTransport::new(vec![]));
        fetcher
            .fetch_missing("http://example.com/target", &[], &mut writer)
            .unwrap();
    }

    #[test]
    fn fetch_missing_handles_200_as_full_body() {
        let target = b"ABCDEFGH";
        let control = control_for(target, 4);
        let dir = tempfile::tempdir().unwrap();
        let mut writer = writer::OutputFileWriter::create(&control, dir.path().join("o")).unwrap();

        let mut fetcher = RangeFetcher::new(FakeTransport::new(vec![RawResponse {
            status: 200,
            content_type: None,
            content_range: None,
            body: target.to_vec(),
        }]));

        fetcher
            .fetch_missing("http://example.com/target", &[(0, 8)], &mut writer)
            .unwrap();
        assert!(writer.is_complete());
    }

    #[test]
    fn fetch_missing_handles_single_range_206() {
        let target = b"ABCDEFGH";
        let control = control_for(target, 4);
        let dir = tempfile::tempdir().unwrap();
        let mut writer = writer::OutputFileWriter::create(&control, dir.path().join("o")).unwrap();
        writer.write_block(0, &target[0..4]);

        let mut fetcher = RangeFetcher::new(FakeTransport::new(vec![RawResponse {
            status: 206,
            content_type: None,
            content_range: Some("bytes 4-7/8".to_string()),
            body: target[4..8].to_vec(),
        }]));

        fetcher
            .fetch_missing("http://example.com/target", &[(4, 8)], &mut writer)
            .unwrap();
        assert!(writer.is_complete());
    }

    #[test]
    fn fetch_missing_handles_multipart_byteranges() {
        let target = b"ABCDEFGH";
        let control = control_for(target, 4);
        let dir = tempfile::tempdir().unwrap();
        let mut writer = writer::OutputFileWriter::create(&control, dir.path().join("o")).unwrap();

        let body = b"--B\r\nContent-Range: bytes 0-3/8\r\n\r\nABCD\r\n--B\r\nContent-Range: bytes 4-7/8\r\n\r\nEFGH\r\n--B--\r\n".to_vec();

        let mut fetcher = RangeFetcher::new(FakeTransport::new(vec![RawResponse {
            status: 206,
            content_type: Some("multipart/byteranges; boundary=B".to_string()),
            content_range: None,
            body,
        }]));

        fetcher
            .fetch_missing("http://example.com/target", &[(0, 4), (4, 8)], &mut writer)
            .unwrap();
        assert!(writer.is_complete());
    }

    #[test]
    fn fetch_missing_fails_on_unexpected_status() {
        let target = b"ABCDEFGH";
        let control = control_for(target, 4);
        let dir = tempfile::tempdir().unwrap();
        let mut writer = writer::OutputFileWriter::create(&control, dir.path().join("o")).unwrap();

        let mut fetcher = RangeFetcher::new(FakeTransport::new(vec![RawResponse {
            status: 500,
            content_type: None,
            content_range: None,
            body: vec![],
        }]));

        let err = fetcher
            .fetch_missing("http://example.com/target", &[(0, 8)], &mut writer)
            .unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedStatus { code: 500 }));
    }

    #[test]
    fn fetch_missing_retries_once_on_401_with_credentials() {
        let target = b"ABCDEFGH";
        let control = control_for(target, 4);
        let dir = tempfile::tempdir().unwrap();
        let mut writer = writer::OutputFileWriter::create(&control, dir.path().join("o")).unwrap();

        let mut creds = FxHashMap::default();
        creds.insert(
            "example.com".to_string(),
            Credentials {
                username: "u".to_string(),
                password: "p".to_string(),
            },
        );

        let mut fetcher = RangeFetcher::with_credentials(
            FakeTransport::new(vec![
                RawResponse {
                    status: 401,
                    content_type: None,
                    content_range: None,
                    body: vec![],
                },
                RawResponse {
                    status: 200,
                    content_type: None,
                    content_range: None,
                    body: target.to_vec(),
                },
            ]),
            creds,
        );

        fetcher
            .fetch_missing("http://example.com/target", &[(0, 8)], &mut writer)
            .unwrap();
        assert!(writer.is_complete());
    }
}
