//! Backend endpoint client.
//!
//! All server interaction is a form-encoded `POST` to one shared endpoint
//! URL. The body always carries an `action` field selecting the operation
//! and the session `nonce`; the response is a JSON envelope
//! `{ success: bool, data: <payload or error message> }`.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::session::Session;

/// Default timeout for endpoint requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Multipart field name the backend expects for image uploads.
const UPLOAD_FIELD: &str = "image";

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the endpoint URL handed over by the host environment:
/// - strip trailing slashes
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_endpoint_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    url
}

fn decode_connection_string_payload(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str::<Value>(trimmed).ok();
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.starts_with('{') {
        return serde_json::from_str::<Value>(&compact).ok();
    }
    if compact.len() < 20 {
        return None;
    }

    let base64 = compact.replace('-', "+").replace('_', "/");
    let padded = format!(
        "{}{}",
        base64,
        "=".repeat((4usize.wrapping_sub(base64.len() % 4)) % 4)
    );
    let decoded = BASE64_STANDARD.decode(padded).ok()?;
    serde_json::from_slice::<Value>(&decoded).ok()
}

/// Extract the session nonce from a connection string (raw or base64 JSON
/// `{ "url": ..., "nonce": ... }` as issued by the host platform).
pub fn extract_nonce_from_connection_string(raw: &str) -> Option<String> {
    decode_connection_string_payload(raw)
        .and_then(|v| {
            v.get("nonce")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
        })
        .filter(|s| !s.is_empty())
}

pub fn extract_endpoint_from_connection_string(raw: &str) -> Option<String> {
    decode_connection_string_payload(raw)
        .and_then(|v| {
            v.get("url")
                .and_then(Value::as_str)
                .map(normalize_endpoint_url)
        })
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Failure modes of an endpoint round trip. Screens convert these to plain
/// strings for display; background polls log them and move on.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("{0}")]
    Transport(String),
    /// The endpoint answered with a non-2xx status.
    #[error("{0}")]
    Status(String),
    /// The body was not a decodable JSON envelope.
    #[error("Invalid response from backend: {0}")]
    Decode(String),
    /// The envelope carried `success: false`.
    #[error("{action} rejected: {message}")]
    Rejected { action: String, message: String },
}

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach backend at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid endpoint URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 | 403 => "Session expired or nonce rejected, reload the admin page".to_string(),
        404 => "Backend endpoint not found".to_string(),
        s if s >= 500 => format!("Backend server error (HTTP {s})"),
        s => format!("Unexpected response from backend (HTTP {s})"),
    }
}

/// Pull a human-readable message out of a `success: false` payload. The
/// backend sends either a bare string or `{ "message": ... }`.
fn rejection_message(data: &Value) -> String {
    data.as_str()
        .map(|s| s.to_string())
        .or_else(|| crate::value_str(data, &["message", "error"]))
        .unwrap_or_else(|| "Request failed".to_string())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated client for the shared admin endpoint.
pub struct ApiClient {
    http: Client,
    endpoint: String,
    nonce: String,
}

impl ApiClient {
    pub fn new(endpoint: &str, nonce: &str) -> Result<Self, ApiError> {
        let endpoint = normalize_endpoint_url(endpoint);
        if endpoint.trim().is_empty() {
            return Err(ApiError::Transport("Endpoint URL is empty".into()));
        }
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint,
            nonce: nonce.trim().to_string(),
        })
    }

    pub fn from_session(session: &Session) -> Result<Self, ApiError> {
        Self::new(session.endpoint_url(), session.nonce())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform one `action` round trip. `fields` are appended to the
    /// mandatory `action` and `nonce` form fields. Returns the `data`
    /// payload of a successful envelope.
    pub async fn post_action(
        &self,
        action: &str,
        fields: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let request_id = Uuid::new_v4();
        let mut form: Vec<(&str, String)> = Vec::with_capacity(fields.len() + 2);
        form.push(("action", action.to_string()));
        form.push(("nonce", self.nonce.clone()));
        form.extend(fields.iter().map(|(k, v)| (*k, v.clone())));

        debug!(%request_id, action, "endpoint request");

        let resp = self
            .http
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::Transport(friendly_error(&self.endpoint, &e)))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%request_id, action, status = status.as_u16(), "endpoint request failed");
            return Err(ApiError::Status(status_error(status)));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Transport(friendly_error(&self.endpoint, &e)))?;
        self.decode_envelope(action, &body)
    }

    /// Upload an image through the same endpoint as a multipart form
    /// (`action=rms_upload_image`). Returns the stored image URL.
    pub async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| ApiError::Transport(format!("Invalid upload part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("action", "rms_upload_image")
            .text("nonce", self.nonce.clone())
            .part(UPLOAD_FIELD, part);

        let resp = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Transport(friendly_error(&self.endpoint, &e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status_error(status)));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Transport(friendly_error(&self.endpoint, &e)))?;
        let data = self.decode_envelope("rms_upload_image", &body)?;
        crate::value_str(&data, &["url", "image_url"])
            .ok_or_else(|| ApiError::Decode("upload response missing image URL".into()))
    }

    fn decode_envelope(&self, action: &str, body: &str) -> Result<Value, ApiError> {
        let envelope: Value = serde_json::from_str(body).map_err(|e| {
            ApiError::Decode(format!("{action}: {e}"))
        })?;
        let success = envelope
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let data = envelope.get("data").cloned().unwrap_or(Value::Null);
        if !success {
            return Err(ApiError::Rejected {
                action: action.to_string(),
                message: rejection_message(&data),
            });
        }
        Ok(data)
    }
}
