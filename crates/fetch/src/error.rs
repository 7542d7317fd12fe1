/// Errors raised while driving the ranged HTTP fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The underlying HTTP transport failed (connection, TLS, timeout).
    #[error("HTTP transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server responded with a status other than 200 or 206.
    #[error("unexpected HTTP status {code}")]
    UnexpectedStatus {
        /// The status code the server returned.
        code: u16,
    },

    /// A response claimed to be ranged but its framing could not be parsed
    /// (missing/malformed `Content-Range`, unterminated multipart body).
    #[error("malformed range response: {reason}")]
    MalformedResponse {
        /// Description of what was wrong with the framing.
        reason: String,
    },

    /// Writing received bytes into the output file failed.
    #[error(transparent)]
    Writer(#[from] writer::WriterError),
}
