use rustc_hash::FxHashSet;

/// Basic-auth credentials for a single host.
#[derive(Clone, Debug)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Encodes the credentials as an `Authorization: Basic ...` header
    /// value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        use base64::Engine as _;
        let raw = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }
}

/// Tracks, for the duration of a single run, which hosts have already had
/// a Basic-auth challenge answered successfully.
///
/// Per the zsync range-fetch contract: HTTP (not HTTPS) requests never
/// preemptively send credentials, since doing so before a redirect to
/// HTTPS would leak them over a plaintext connection. HTTPS requests to a
/// host already known to accept Basic auth send it up front, skipping the
/// round trip through a 401.
#[derive(Default)]
pub struct HostAuthCache {
    succeeded_https_hosts: FxHashSet<String>,
}

impl HostAuthCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `host` answered a Basic-auth challenge successfully
    /// over HTTPS.
    pub fn record_success(&mut self, host: &str) {
        self.succeeded_https_hosts.insert(host.to_string());
    }

    /// Returns whether credentials should be sent preemptively for this
    /// request, given its scheme and host.
    #[must_use]
    pub fn should_send_preemptively(&self, scheme: &str, host: &str) -> bool {
        scheme.eq_ignore_ascii_case("https") && self.succeeded_https_hosts.contains(host)
    }
}
