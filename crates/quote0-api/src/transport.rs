// Transport session for the Dot. App service.
//
// Owns the keep-alive `reqwest::Client` with the API credential installed
// as a sensitive default header, and executes raw HTTP exchanges. Mapping
// status codes onto the error taxonomy is the client layer's job -- this
// module only raises transport-level failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::Error;

/// Raw result of one HTTP exchange: status plus unparsed body.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    /// Parsed `Retry-After` header, when the server sent one.
    pub retry_after_secs: Option<u64>,
    pub body: String,
}

/// One persistent connection context to the Dot. App service.
///
/// Cheap to clone -- clones share the connection pool and the closed flag,
/// so `close()` on any handle closes them all. Safe for concurrent use;
/// the configuration is immutable after `open`.
#[derive(Debug, Clone)]
pub struct Session {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
    closed: Arc<AtomicBool>,
}

impl Session {
    /// Open a session from a validated config.
    ///
    /// Installs `Authorization: Bearer <api_key>` as a default header on
    /// every request the session will execute.
    pub fn open(config: &ClientConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret())).map_err(
                |e| Error::Configuration {
                    message: format!("api_key is not a valid header value: {e}"),
                },
            )?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("quote0-api/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: normalize_base_url(&config.base_url),
            timeout_secs: config.timeout.as_secs(),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Join a relative path (e.g. `"api/authV2/open/devices"`) onto the
    /// base URL.
    fn url(&self, path: &str) -> Url {
        // base_url always ends with `/`, so joining relative paths appends.
        self.base_url
            .join(path)
            .expect("path should be a valid relative URL")
    }

    /// Execute one HTTP exchange: one network round trip, no retries, no
    /// domain-error classification.
    ///
    /// Fails with [`Error::SessionClosed`] after [`close`](Self::close),
    /// and with [`Error::Timeout`] / [`Error::Transport`] on network-level
    /// failures. Any HTTP status, 2xx or not, is a successful exchange.
    pub async fn execute<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<RawResponse, Error> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }

        let url = self.url(path);
        debug!("{method} {url}");

        let mut request = self.http.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = resp.status();
        let retry_after_secs = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = resp
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        Ok(RawResponse {
            status,
            retry_after_secs,
            body,
        })
    }

    fn map_transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Mark the session closed. Idempotent -- a second call is a no-op.
    ///
    /// Subsequent `execute` calls fail with [`Error::SessionClosed`];
    /// pooled connections are released once the last clone is dropped.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("session closed");
        }
    }

    /// Whether `close()` has been called on this session or any clone.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Ensure the base URL path ends with `/` so relative joins append instead
/// of replacing the last segment.
fn normalize_base_url(raw: &Url) -> Url {
    let mut url = raw.clone();
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    url
}
