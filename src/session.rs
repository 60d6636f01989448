//! In-memory session configuration.
//!
//! The host platform hands the console an endpoint URL and a per-session
//! anti-forgery nonce, either as two environment variables or as a single
//! connection string. Nothing is persisted locally: the console rebuilds its
//! view entirely from server state on every start, and the nonce is wiped
//! from memory on drop.

use zeroize::Zeroizing;

use crate::api;

/// Environment variable carrying a combined connection string
/// (`{ "url": ..., "nonce": ... }`, raw or base64).
pub const ENV_CONNECTION: &str = "RMS_CONNECTION";
/// Environment variable carrying the bare endpoint URL.
pub const ENV_ENDPOINT_URL: &str = "RMS_ENDPOINT_URL";
/// Environment variable carrying the bare session nonce.
pub const ENV_NONCE: &str = "RMS_NONCE";

pub struct Session {
    endpoint_url: String,
    nonce: Zeroizing<String>,
}

impl Session {
    pub fn new(endpoint_url: &str, nonce: &str) -> Result<Self, String> {
        let endpoint_url = api::normalize_endpoint_url(endpoint_url);
        let nonce = nonce.trim();
        if endpoint_url.is_empty() {
            return Err("Session not configured: missing endpoint URL".into());
        }
        if nonce.is_empty() {
            return Err("Session not configured: missing nonce".into());
        }
        Ok(Self {
            endpoint_url,
            nonce: Zeroizing::new(nonce.to_string()),
        })
    }

    /// Build a session from a connection string issued by the host platform.
    pub fn from_connection_string(raw: &str) -> Result<Self, String> {
        let endpoint = api::extract_endpoint_from_connection_string(raw)
            .ok_or("Connection string is missing the endpoint URL")?;
        let nonce = api::extract_nonce_from_connection_string(raw)
            .ok_or("Connection string is missing the nonce")?;
        Self::new(&endpoint, &nonce)
    }

    /// Read session config from the environment. A combined connection
    /// string takes precedence over the two separate variables.
    pub fn from_env() -> Result<Self, String> {
        if let Ok(raw) = std::env::var(ENV_CONNECTION) {
            if !raw.trim().is_empty() {
                return Self::from_connection_string(&raw);
            }
        }
        let endpoint = std::env::var(ENV_ENDPOINT_URL)
            .map_err(|_| format!("Session not configured: set {ENV_ENDPOINT_URL} or {ENV_CONNECTION}"))?;
        let nonce = std::env::var(ENV_NONCE)
            .map_err(|_| format!("Session not configured: set {ENV_NONCE} or {ENV_CONNECTION}"))?;
        Self::new(&endpoint, &nonce)
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }
}

/// The console is considered configured when the environment carries either
/// a connection string or both separate variables.
pub fn is_configured() -> bool {
    let non_empty = |key: &str| {
        std::env::var(key)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    };
    non_empty(ENV_CONNECTION) || (non_empty(ENV_ENDPOINT_URL) && non_empty(ENV_NONCE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var(ENV_CONNECTION);
        std::env::remove_var(ENV_ENDPOINT_URL);
        std::env::remove_var(ENV_NONCE);
    }

    #[test]
    fn test_new_rejects_blank_fields() {
        assert!(Session::new("", "abc").is_err());
        assert!(Session::new("https://rms.example", "   ").is_err());
    }

    #[test]
    fn test_new_normalizes_endpoint() {
        let session = Session::new("rms.example/endpoint/", "n0nce").unwrap();
        assert_eq!(session.endpoint_url(), "https://rms.example/endpoint");
        assert_eq!(session.nonce(), "n0nce");
    }

    #[test]
    #[serial]
    fn test_from_env_prefers_connection_string() {
        clear_env();
        std::env::set_var(
            ENV_CONNECTION,
            r#"{"url":"https://conn.example/endpoint","nonce":"conn-nonce"}"#,
        );
        std::env::set_var(ENV_ENDPOINT_URL, "https://other.example");
        std::env::set_var(ENV_NONCE, "other-nonce");

        let session = Session::from_env().unwrap();
        assert_eq!(session.endpoint_url(), "https://conn.example/endpoint");
        assert_eq!(session.nonce(), "conn-nonce");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_falls_back_to_separate_vars() {
        clear_env();
        std::env::set_var(ENV_ENDPOINT_URL, "https://sep.example/endpoint");
        std::env::set_var(ENV_NONCE, "sep-nonce");

        let session = Session::from_env().unwrap();
        assert_eq!(session.endpoint_url(), "https://sep.example/endpoint");
        assert!(is_configured());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unconfigured_environment() {
        clear_env();
        assert!(!is_configured());
        assert!(Session::from_env().is_err());
    }
}
