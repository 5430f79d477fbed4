// Hand-crafted async client for the Quote/0 open API.
//
// Base path: /api/authV2/open/
// Auth: Authorization: Bearer <api key> (installed by the Session)
//
// Every operation follows the same pipeline: build the request, execute
// one exchange through the Session, then run the shared decode-and-classify
// routine. Status-to-error mapping lives in exactly one place (`classify`).

use std::future::Future;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::transport::{RawResponse, Session};
use crate::types::{
    ApiResponse, Device, DeviceStatus, ImageContentRequest, Task, TaskQueue, TextContentRequest,
};

const BASE_PATH: &str = "api/authV2/open";

/// Body type for requests that have none.
const NO_BODY: Option<&()> = None;

// ── Error envelope ───────────────────────────────────────────────────

/// Error bodies reuse the `{code, message}` envelope; only `message`
/// matters for classification.
#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
}

// ── Retry backoff ────────────────────────────────────────────────────

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

fn backoff_delay(attempt: u32) -> Duration {
    INITIAL_BACKOFF
        .saturating_mul(2_u32.saturating_pow(attempt.min(16)))
        .min(MAX_BACKOFF)
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Quote/0 e-ink display open API.
///
/// One blocking-equivalent HTTP exchange per method invocation -- no
/// background threads, no internal queueing, no caching. Cheap to clone;
/// clones share one [`Session`], so concurrent callers may either share a
/// client or open their own.
///
/// ```no_run
/// use quote0_api::types::TextContentRequest;
/// use quote0_api::Quote0Client;
///
/// # async fn run() -> Result<(), quote0_api::Error> {
/// let client = Quote0Client::from_api_key("api-key-from-dot-app")?;
/// for device in client.get_devices().await? {
///     let text = TextContentRequest::new("Hello", "World!")?;
///     client.send_text(&device.id, &text).await?;
/// }
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Quote0Client {
    session: Session,
    max_retries: u32,
}

impl Quote0Client {
    // ── Constructors & lifecycle ─────────────────────────────────────

    /// Build a client from a validated config.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let max_retries = config.max_retries;
        Ok(Self {
            session: Session::open(&config)?,
            max_retries,
        })
    }

    /// Convenience constructor: production endpoint, default timeout, no
    /// automatic retries.
    pub fn from_api_key(api_key: impl Into<String>) -> Result<Self, Error> {
        Self::new(ClientConfig::new(api_key)?)
    }

    /// Run `op` against a fresh client and close the session on every exit
    /// path, including when `op` fails.
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), quote0_api::Error> {
    /// use quote0_api::{ClientConfig, Quote0Client};
    ///
    /// let config = ClientConfig::new("api-key")?;
    /// let devices = Quote0Client::scoped(config, |client| async move {
    ///     client.get_devices().await
    /// })
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scoped<T, F, Fut>(config: ClientConfig, op: F) -> Result<T, Error>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let client = Self::new(config)?;
        let result = op(client.clone()).await;
        client.close();
        result
    }

    /// Close the underlying session. Idempotent -- a second call is a
    /// no-op. Subsequent operations fail with [`Error::SessionClosed`].
    pub fn close(&self) {
        self.session.close();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// All registered devices -- `GET /api/authV2/open/devices`.
    ///
    /// Order is whatever the server returns and is not guaranteed stable
    /// across calls. An empty list is a valid, non-error result.
    pub async fn get_devices(&self) -> Result<Vec<Device>, Error> {
        self.request(Method::GET, &format!("{BASE_PATH}/devices"), NO_BODY)
            .await
    }

    /// Current status snapshot for one device --
    /// `GET /api/authV2/open/device/{id}/status`.
    pub async fn get_device_status(&self, device_id: &str) -> Result<DeviceStatus, Error> {
        let device_id = ensure_device_id(device_id)?;
        self.request(
            Method::GET,
            &format!("{BASE_PATH}/device/{device_id}/status"),
            NO_BODY,
        )
        .await
    }

    /// Advance the device to the next queued content --
    /// `POST /api/authV2/open/device/{id}/next`.
    ///
    /// Idempotent at the server; repeating the call is safe.
    pub async fn switch_to_next(&self, device_id: &str) -> Result<ApiResponse, Error> {
        let device_id = ensure_device_id(device_id)?;
        let resp = self
            .request(
                Method::POST,
                &format!("{BASE_PATH}/device/{device_id}/next"),
                NO_BODY,
            )
            .await?;
        check_envelope(resp)
    }

    /// Queued content-push tasks for a device --
    /// `GET /api/authV2/open/device/{id}/{queue}/list`.
    ///
    /// `queue` defaults to [`TaskQueue::Loop`], the only queue the service
    /// exposes today. An empty list is a valid, non-error result.
    pub async fn list_tasks(
        &self,
        device_id: &str,
        queue: Option<TaskQueue>,
    ) -> Result<Vec<Task>, Error> {
        let device_id = ensure_device_id(device_id)?;
        let queue = queue.unwrap_or_default();
        self.request(
            Method::GET,
            &format!("{BASE_PATH}/device/{device_id}/{queue}/list"),
            NO_BODY,
        )
        .await
    }

    /// Push text content -- `POST /api/authV2/open/device/{id}/text`.
    ///
    /// Runs the payload's local validation first; a malformed payload is
    /// rejected before any network call.
    pub async fn send_text(
        &self,
        device_id: &str,
        content: &TextContentRequest,
    ) -> Result<ApiResponse, Error> {
        let device_id = ensure_device_id(device_id)?;
        content.validate()?;
        let resp = self
            .request(
                Method::POST,
                &format!("{BASE_PATH}/device/{device_id}/text"),
                Some(content),
            )
            .await?;
        check_envelope(resp)
    }

    /// Push image content -- `POST /api/authV2/open/device/{id}/image`.
    ///
    /// Runs the payload's local validation first; a malformed payload is
    /// rejected before any network call.
    pub async fn send_image(
        &self,
        device_id: &str,
        content: &ImageContentRequest,
    ) -> Result<ApiResponse, Error> {
        let device_id = ensure_device_id(device_id)?;
        content.validate()?;
        let resp = self
            .request(
                Method::POST,
                &format!("{BASE_PATH}/device/{device_id}/image"),
                Some(content),
            )
            .await?;
        check_envelope(resp)
    }

    // ── Request pipeline ─────────────────────────────────────────────

    /// Execute with the bounded retry policy: transient failures (rate
    /// limit, connect/timeout) are resent up to `max_retries` extra
    /// attempts with exponential backoff. Everything else propagates
    /// immediately.
    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let mut attempt: u32 = 0;
        loop {
            let raw = self.session.execute(method.clone(), path, &[], body).await;
            let result = raw.and_then(decode);
            match result {
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    attempt += 1;
                    warn!(
                        "transient failure ({err}), retry {attempt}/{} in {delay:?}",
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

// ── Decode and classify ──────────────────────────────────────────────

/// Shared decode routine: a non-2xx status short-circuits to a classified
/// error regardless of body content; a 2xx body must decode into `T`
/// exactly -- a shape mismatch is a protocol error, never a silent
/// default.
fn decode<T: DeserializeOwned>(raw: RawResponse) -> Result<T, Error> {
    if !raw.status.is_success() {
        return Err(classify(&raw));
    }
    serde_json::from_str(&raw.body).map_err(|e| {
        let preview = raw.body.get(..raw.body.len().min(200)).unwrap_or(&raw.body);
        Error::Protocol {
            message: format!("{e} (body preview: {preview:?})"),
            body: raw.body.clone(),
        }
    })
}

/// Map a non-2xx exchange onto the error taxonomy. The server envelope's
/// `message` is preferred when the body parses; otherwise a client-side
/// description of the failure kind.
fn classify(raw: &RawResponse) -> Error {
    let message = |fallback: &str| -> String {
        serde_json::from_str::<ErrorEnvelope>(&raw.body)
            .ok()
            .and_then(|envelope| envelope.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_owned())
    };

    match raw.status {
        StatusCode::BAD_REQUEST => Error::Validation {
            message: message("request validation failed"),
        },
        StatusCode::UNAUTHORIZED => Error::Authentication {
            message: message("invalid or expired API key"),
        },
        StatusCode::FORBIDDEN => Error::Permission {
            message: message("insufficient permissions for this device or operation"),
        },
        StatusCode::NOT_FOUND => Error::NotFound {
            message: message("device or resource not found"),
        },
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited {
            message: message("rate limit exceeded (10 requests/second)"),
            retry_after_secs: raw.retry_after_secs,
        },
        status => Error::Server {
            status: status.as_u16(),
            message: message(&format!("server returned HTTP {status}")),
        },
    }
}

/// A 2xx failure envelope must explain itself; one without a message
/// indicates a server contract violation.
fn check_envelope(resp: ApiResponse) -> Result<ApiResponse, Error> {
    if !resp.success() && resp.message.is_empty() {
        return Err(Error::Protocol {
            message: "failure envelope is missing its message".into(),
            body: serde_json::to_string(&resp).unwrap_or_default(),
        });
    }
    Ok(resp)
}

fn ensure_device_id(device_id: &str) -> Result<&str, Error> {
    let trimmed = device_id.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: "device_id must not be empty".into(),
        });
    }
    Ok(trimmed)
}
