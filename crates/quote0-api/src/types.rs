//! Wire data model for the Dot. App open API.
//!
//! All types match the JSON bodies of `/api/authV2/open/` endpoints.
//! Field names use camelCase via `#[serde(rename_all = "camelCase")]`.
//! Request payloads validate themselves locally -- malformed input never
//! reaches the transport.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

// ── Payload bounds ───────────────────────────────────────────────────

/// Maximum length of a text title, in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Maximum length of a text message, in characters.
pub const MESSAGE_MAX_CHARS: usize = 2000;

/// Maximum length of a text signature, in characters.
pub const SIGNATURE_MAX_CHARS: usize = 100;

// ── Devices ──────────────────────────────────────────────────────────

/// A registered device -- from `GET /api/authV2/open/devices`.
///
/// Immutable once returned. `id` is the serial number every per-device
/// call takes; there is no in-process device registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Hardware family (e.g. `"quote"`).
    pub series: String,
    /// Model within the family (e.g. `"quote_0"`).
    pub model: String,
    /// Hardware edition (1 or 2).
    pub edition: u8,
    /// Device serial number.
    pub id: String,
}

// ── Device status ────────────────────────────────────────────────────

/// Point-in-time status snapshot for one device -- from
/// `GET /api/authV2/open/device/{id}/status`.
///
/// Freshly constructed on every query; nothing is cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    /// Device serial number.
    pub device_id: String,
    /// User-assigned name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// User-assigned location, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Battery and WiFi vitals.
    pub status: DeviceHealth,
    /// What the display is showing and when it refreshes next.
    pub render_info: RenderInfo,
}

/// Battery and WiFi vitals. The service reports these as display strings
/// (`"100%"`, `"Excellent"`), not numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceHealth {
    /// Device firmware version.
    pub version: String,
    /// Current charge reading.
    pub current: String,
    /// Human-readable description of the current state.
    pub description: String,
    /// Battery level.
    pub battery: String,
    /// WiFi signal strength.
    pub wifi: String,
}

/// Rendering state for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderInfo {
    /// Last render timestamp.
    pub last: String,
    pub current: CurrentRender,
    pub next: NextRender,
}

/// What the display is showing right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRender {
    pub rotated: bool,
    pub border: Border,
    /// Render image URLs.
    pub image: Vec<String>,
}

/// Upcoming scheduled refresh timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRender {
    pub battery: String,
    pub power: String,
}

// ── Shared enums ─────────────────────────────────────────────────────

/// Display border style. Serialized as the integer the wire expects
/// (0 = white, 1 = black).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Border {
    #[default]
    White,
    Black,
}

impl TryFrom<u8> for Border {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::White),
            1 => Ok(Self::Black),
            other => Err(format!("invalid border value: {other} (expected 0 or 1)")),
        }
    }
}

impl From<Border> for u8 {
    fn from(border: Border) -> Self {
        match border {
            Border::White => 0,
            Border::Black => 1,
        }
    }
}

/// Dithering algorithm applied when rendering an image to e-ink.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DitherType {
    /// Error diffusion (see [`DitherKernel`]).
    #[default]
    Diffusion,
    /// Ordered (Bayer) dithering.
    Ordered,
    /// No dithering -- plain threshold.
    None,
}

/// Error-diffusion kernel, used when the dither type is
/// [`DitherType::Diffusion`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DitherKernel {
    #[default]
    FloydSteinberg,
    Atkinson,
}

// ── Tasks ────────────────────────────────────────────────────────────

/// Content-push task kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "TEXT_API")]
    Text,
    #[serde(rename = "IMAGE_API")]
    Image,
    /// Forward-compatible catch-all for kinds this crate does not know.
    #[serde(other)]
    Other,
}

/// Server-side task queue addressed by
/// [`list_tasks`](crate::Quote0Client::list_tasks).
///
/// `loop` is the only queue the service exposes today; modeling it as a
/// closed enum makes an invalid queue name unrepresentable.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum TaskQueue {
    #[default]
    Loop,
}

/// A queued content-push operation -- from
/// `GET /api/authV2/open/device/{id}/{queue}/list`.
///
/// Tasks are created server-side as a side effect of send operations; the
/// client never mutates them. Fields beyond `type` and `key` are populated
/// according to the task kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Unique task key.
    pub key: String,
    #[serde(default = "default_true")]
    pub refresh_now: bool,
    /// Text tasks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Text tasks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Image tasks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
    /// Image tasks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dither_type: Option<DitherType>,
    /// Image tasks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dither_kernel: Option<DitherKernel>,
}

fn default_true() -> bool {
    true
}

// ── Content requests ─────────────────────────────────────────────────

/// Caller-constructed text payload for
/// `POST /api/authV2/open/device/{id}/text`.
///
/// `title` and `message` are required and length-bounded; everything else
/// is optional and omitted from the JSON body when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContentRequest {
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Base64 PNG icon, 40px x 40px.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Reuse an existing task key instead of creating a new task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_key: Option<String>,
    /// Render immediately instead of waiting for the next scheduled
    /// refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_now: Option<bool>,
}

impl TextContentRequest {
    /// Build a payload from the two required fields, validating bounds.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Result<Self, Error> {
        let request = Self {
            title: title.into(),
            message: message.into(),
            refresh_now: Some(true),
            ..Self::default()
        };
        request.validate()?;
        Ok(request)
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_task_key(mut self, task_key: impl Into<String>) -> Self {
        self.task_key = Some(task_key.into());
        self
    }

    pub fn refresh_now(mut self, refresh_now: bool) -> Self {
        self.refresh_now = Some(refresh_now);
        self
    }

    /// Structural validation -- runs before any network call.
    pub fn validate(&self) -> Result<(), Error> {
        non_empty("title", &self.title)?;
        max_chars("title", &self.title, TITLE_MAX_CHARS)?;
        non_empty("message", &self.message)?;
        max_chars("message", &self.message, MESSAGE_MAX_CHARS)?;
        if let Some(signature) = &self.signature {
            max_chars("signature", signature, SIGNATURE_MAX_CHARS)?;
        }
        if let Some(icon) = &self.icon {
            well_formed_base64("icon", icon)?;
        }
        Ok(())
    }
}

/// Caller-constructed image payload for
/// `POST /api/authV2/open/device/{id}/image`.
///
/// `image` carries the rendered PNG (296px x 152px) as standard base64
/// embedded in the JSON body -- not raw binary multipart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContentRequest {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub border: Border,
    #[serde(default)]
    pub dither_type: DitherType,
    #[serde(default)]
    pub dither_kernel: DitherKernel,
    /// Reuse an existing task key instead of creating a new task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_now: Option<bool>,
}

impl ImageContentRequest {
    /// Build a payload from the required base64 image, validating it.
    pub fn new(image: impl Into<String>) -> Result<Self, Error> {
        let request = Self {
            image: image.into(),
            refresh_now: Some(true),
            ..Self::default()
        };
        request.validate()?;
        Ok(request)
    }

    pub fn with_border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    pub fn with_dither(mut self, dither_type: DitherType, dither_kernel: DitherKernel) -> Self {
        self.dither_type = dither_type;
        self.dither_kernel = dither_kernel;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_task_key(mut self, task_key: impl Into<String>) -> Self {
        self.task_key = Some(task_key.into());
        self
    }

    pub fn refresh_now(mut self, refresh_now: bool) -> Self {
        self.refresh_now = Some(refresh_now);
        self
    }

    /// Structural validation -- runs before any network call.
    pub fn validate(&self) -> Result<(), Error> {
        well_formed_base64("image", &self.image)
    }
}

// ── Response envelope ────────────────────────────────────────────────

/// `code` arrives as either a bare integer or a quoted string depending
/// on the endpoint; both spellings of zero mean success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseCode {
    Number(i64),
    Text(String),
}

impl ResponseCode {
    pub fn is_success(&self) -> bool {
        match self {
            Self::Number(code) => *code == 0,
            Self::Text(code) => code == "0",
        }
    }
}

/// Generic envelope returned by mutating operations.
///
/// A failure envelope always carries a non-empty `message`; the client
/// treats a 2xx failure envelope without one as a protocol error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub code: ResponseCode,
    /// Human-readable outcome description.
    pub message: String,
    /// Operation-specific payload; kept as opaque JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl ApiResponse {
    /// Whether the service accepted the operation.
    pub fn success(&self) -> bool {
        self.code.is_success()
    }
}

// ── Validation helpers ───────────────────────────────────────────────

fn non_empty(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Validation {
            message: format!("{field} must not be empty"),
        });
    }
    Ok(())
}

fn max_chars(field: &str, value: &str, max: usize) -> Result<(), Error> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::Validation {
            message: format!("{field} is {len} characters (maximum {max})"),
        });
    }
    Ok(())
}

fn well_formed_base64(field: &str, value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::Validation {
            message: format!("{field} must not be empty"),
        });
    }
    match BASE64.decode(value) {
        Ok(_) => Ok(()),
        Err(e) => Err(Error::Validation {
            message: format!("{field} is not valid base64: {e}"),
        }),
    }
}
