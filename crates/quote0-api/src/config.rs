// Client configuration: credential, endpoint, timeout, retry budget.
//
// Validation happens at construction, so a `ClientConfig` that exists is
// always usable -- `Session::open` never re-checks these invariants.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::Error;

/// Production endpoint of the Dot. App service.
pub const DEFAULT_BASE_URL: &str = "https://dot.mindreset.tech";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection-level configuration for a [`Quote0Client`](crate::Quote0Client).
///
/// ```no_run
/// use quote0_api::ClientConfig;
///
/// let config = ClientConfig::new("api-key-from-dot-app")?
///     .with_timeout(std::time::Duration::from_secs(10))
///     .with_max_retries(3);
/// # Ok::<(), quote0_api::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) api_key: SecretString,
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) max_retries: u32,
}

impl ClientConfig {
    /// Build a config for the production endpoint with default timeout and
    /// no automatic retries.
    ///
    /// Fails with [`Error::Configuration`] if `api_key` is empty or
    /// whitespace.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Configuration {
                message: "api_key cannot be empty".into(),
            });
        }

        let base_url =
            Url::parse(DEFAULT_BASE_URL).expect("default base URL should be well-formed");

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url,
            timeout: DEFAULT_TIMEOUT,
            max_retries: 0,
        })
    }

    /// Point the client at a compatible alternate service.
    ///
    /// Fails with [`Error::Configuration`] if `base_url` is not a
    /// well-formed http(s) URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, Error> {
        let url = Url::parse(base_url).map_err(|e| Error::Configuration {
            message: format!("invalid base_url {base_url:?}: {e}"),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Configuration {
                message: format!("base_url must use http or https, got {:?}", url.scheme()),
            });
        }
        self.base_url = url;
        Ok(self)
    }

    /// Per-request timeout. Surfaced as [`Error::Timeout`] when exceeded.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Opt into bounded automatic retry of transient failures (rate limit,
    /// connect/timeout) with exponential backoff. Default is 0: every
    /// failure is reported to the caller immediately.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// The configured endpoint.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}
