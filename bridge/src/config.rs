//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables once at startup into
//! an immutable `Config`.

use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Error raised when the environment does not describe a runnable bridge.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// The streaming URL could not be turned into an HTTP base URL.
    #[error("invalid streaming URL {url:?}: {reason}")]
    InvalidStreamingUrl { url: String, reason: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Mattermost websocket endpoint (wss:// or ws://)
    pub ws_url: String,

    /// HTTP base URL derived from `ws_url` (wss → https, ws → http)
    pub base_url: String,

    /// Hostname of the streaming endpoint, sent as `x-bridge-origin`
    pub origin_host: String,

    /// Bot credential used for the auth challenge and identity lookup
    pub bot_token: String,

    /// Automation webhook URL that receives forwarded posts
    pub webhook_url: String,

    /// Optional HMAC secret; absent disables the signature header
    pub shared_secret: Option<String>,

    /// Instance name carried in headers and envelope metadata
    pub instance: String,

    /// Delay between a session closing and the next connect attempt
    pub reconnect_delay: Duration,

    /// Lifetime of a dedup cache entry
    pub dedup_ttl: Duration,

    /// Timeout applied to outbound HTTP requests
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `MM_WS_URL`, `MM_BOT_TOKEN` and `N8N_WEBHOOK` are required; the
    /// remaining variables fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let ws_url = require("MM_WS_URL")?;
        let bot_token = require("MM_BOT_TOKEN")?;
        let webhook_url = require("N8N_WEBHOOK")?;

        let (base_url, origin_host) = derive_http_base(&ws_url)?;

        Ok(Config {
            ws_url,
            base_url,
            origin_host,
            bot_token,
            webhook_url,

            shared_secret: env::var("N8N_SHARED_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),

            instance: env::var("INSTANCE").unwrap_or_else(|_| "mm-bridge".to_string()),

            reconnect_delay: parse_ms("RECONNECT_MS", 3000),

            dedup_ttl: parse_ms("DEDUP_TTL_MS", 10 * 60 * 1000),

            request_timeout: parse_ms("REQUEST_TIMEOUT_MS", 8000),
        })
    }
}

/// Read a required environment variable, rejecting empty values.
fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Parse a millisecond duration from the environment with a default.
fn parse_ms(name: &str, default_ms: u64) -> Duration {
    let ms = env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

/// Derive the HTTP base URL and origin host from the streaming URL.
///
/// The base URL keeps the streaming endpoint's authority and translates the
/// scheme: `wss` becomes `https`, `ws` becomes `http`. Any other scheme is
/// rejected.
fn derive_http_base(ws_url: &str) -> Result<(String, String), ConfigError> {
    let url = Url::parse(ws_url).map_err(|e| ConfigError::InvalidStreamingUrl {
        url: ws_url.to_string(),
        reason: e.to_string(),
    })?;

    let scheme = match url.scheme() {
        "wss" => "https",
        "ws" => "http",
        other => {
            return Err(ConfigError::InvalidStreamingUrl {
                url: ws_url.to_string(),
                reason: format!("unsupported scheme {other:?}"),
            })
        }
    };

    let host = url
        .host_str()
        .ok_or_else(|| ConfigError::InvalidStreamingUrl {
            url: ws_url.to_string(),
            reason: "missing host".to_string(),
        })?
        .to_string();

    let base_url = match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    };

    Ok((base_url, host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_http_base_wss() {
        let (base, host) = derive_http_base("wss://chat.example.com/api/v4/websocket").unwrap();
        assert_eq!(base, "https://chat.example.com");
        assert_eq!(host, "chat.example.com");
    }

    #[test]
    fn test_derive_http_base_ws_with_port() {
        let (base, host) = derive_http_base("ws://localhost:8065/api/v4/websocket").unwrap();
        assert_eq!(base, "http://localhost:8065");
        assert_eq!(host, "localhost");
    }

    #[test]
    fn test_derive_http_base_rejects_http_scheme() {
        let err = derive_http_base("https://chat.example.com/api/v4/websocket").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStreamingUrl { .. }));
    }

    #[test]
    fn test_derive_http_base_rejects_garbage() {
        assert!(derive_http_base("not a url").is_err());
    }

    #[test]
    fn test_parse_ms_default() {
        let d = parse_ms("NONEXISTENT_BRIDGE_VAR", 1234);
        assert_eq!(d, Duration::from_millis(1234));
    }

    #[test]
    fn test_parse_ms_valid() {
        env::set_var("TEST_BRIDGE_MS", "2500");
        let d = parse_ms("TEST_BRIDGE_MS", 0);
        assert_eq!(d, Duration::from_millis(2500));
        env::remove_var("TEST_BRIDGE_MS");
    }

    #[test]
    fn test_require_rejects_empty() {
        env::set_var("TEST_BRIDGE_EMPTY", "");
        assert!(require("TEST_BRIDGE_EMPTY").is_err());
        env::remove_var("TEST_BRIDGE_EMPTY");
    }
}
