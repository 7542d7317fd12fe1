#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! `fetch` builds the single ranged HTTP GET that recovers the bytes a
//! seed scan could not, and routes the response back into the output
//! writer regardless of which of the three response shapes the server
//! chose (`200`, `206` single-range, `206 multipart/byteranges`).
//!
//! # Design
//!
//! [`RangeFetcher`] is generic over [`HttpTransport`] so its framing logic
//! (range-header construction, `Content-Range` parsing, multipart
//! splitting, the once-per-host Basic-auth retry) can be exercised without
//! a socket. [`ReqwestTransport`] is the production implementation.

mod auth;
mod content_range;
mod error;
mod fetcher;
mod multipart;
mod range_header;
mod transport;

pub use auth::{Credentials, HostAuthCache};
pub use content_range::ContentRange;
pub use error::FetchError;
pub use fetcher::RangeFetcher;
pub use transport::{HttpTransport, RawResponse, ReqwestTransport};
