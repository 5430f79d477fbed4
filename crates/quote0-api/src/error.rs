use thiserror::Error;

/// Top-level error type for the `quote0-api` crate.
///
/// A closed taxonomy: callers branch on the failure kind with `matches!`
/// instead of catching broad categories. Status-derived variants carry the
/// server envelope's `message` when one was present, else a client-side
/// description of the failure kind.
#[derive(Debug, Error)]
pub enum Error {
    // ── Status-derived (raised after the exchange completes) ────────
    /// HTTP 401 -- credential invalid or expired. Not retryable without
    /// caller intervention.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// HTTP 403 -- credential valid but not allowed to touch the target
    /// device or operation.
    #[error("Permission denied: {message}")]
    Permission { message: String },

    /// HTTP 404 -- referenced device or resource does not exist.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// HTTP 400, or a local pre-flight validation failure. Local failures
    /// are raised before any network call, so the request never left the
    /// process.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// HTTP 429 -- the service caps at 10 requests/second. Not an
    /// indication the request was invalid; back off and resend.
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        /// Server's `Retry-After` hint in seconds, when present.
        retry_after_secs: Option<u64>,
    },

    /// Any other non-2xx status, 5xx included.
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    // ── Decode ──────────────────────────────────────────────────────
    /// 2xx body unparsable or missing expected fields -- a client/server
    /// version mismatch or transport corruption, not a domain condition.
    /// Carries the raw body for debugging.
    #[error("Protocol error: {message}")]
    Protocol { message: String, body: String },

    // ── Setup & lifecycle ───────────────────────────────────────────
    /// Invalid client setup (empty credential, malformed base URL).
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The session was closed before this call.
    #[error("Session is closed")]
    SessionClosed,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The configured timeout elapsed. Server-side completion of the
    /// interrupted operation is undefined; re-query device or task state
    /// to confirm the outcome.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl Error {
    /// Returns `true` for failures worth resending after a backoff:
    /// rate limiting and transport-level connect/timeout errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
