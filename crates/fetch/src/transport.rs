use crate::error::FetchError;

/// A single HTTP response as the range fetcher needs to see it: status,
/// the headers it cares about, and the full body.
///
/// The body is buffered rather than streamed; control-file-scale ranges
/// make this an acceptable simplification for this crate's scope (see
/// `DESIGN.md`).
#[derive(Clone, Debug)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header value, if present.
    pub content_type: Option<String>,
    /// `Content-Range` header value, if present.
    pub content_range: Option<String>,
    /// Response body.
    pub body: Vec<u8>,
}

/// Synchronous request/response contract the range fetcher depends on.
///
/// Kept minimal and generic over the concrete HTTP client so the fetcher's
/// framing logic can be tested without a socket.
pub trait HttpTransport {
    /// Issues a GET request. `range_header` is the full `Range:` header
    /// value (e.g. `bytes=0-7,10-19`); `authorization` is the full
    /// `Authorization:` header value when credentials should be sent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the request cannot be
    /// completed (connection refused, TLS failure, timeout, ...).
    fn get(
        &mut self,
        url: &str,
        range_header: Option<&str>,
        authorization: Option<&str>,
    ) -> Result<RawResponse, FetchError>;
}

/// [`HttpTransport`] backed by a blocking `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Builds a transport from a pre-configured blocking client.
    #[must_use]
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::blocking::Client::new())
    }
}

impl HttpTransport for ReqwestTransport {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    fn get(
        &mut self,
        url: &str,
        range_header: Option<&str>,
        authorization: Option<&str>,
    ) -> Result<RawResponse, FetchError> {
        let mut request = self.client.get(url);
        if let Some(range) = range_header {
            request = request.header(reqwest::header::RANGE, range);
        }
        if let Some(auth) = authorization {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request
            .send()
            .map_err(|err| FetchError::Transport(Box::new(err)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let content_range = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let body = response
            .bytes()
            .map_err(|err| FetchError::Transport(Box::new(err)))?
            .to_vec();

        Ok(RawResponse {
            status,
            content_type,
            content_range,
            body,
        })
    }
}
