//! Webhook forwarding module.
//!
//! This module builds the signed outbound request for each admitted post:
//!
//! ```text
//! EventFields → Envelope → serialize → AuthProof → POST webhook
//! ```
//!
//! Delivery is best-effort: a transport failure or non-success response is
//! logged by the caller and dropped, never retried.

pub mod envelope;
pub mod signature;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;

pub use envelope::{Envelope, EventFields, SourceMeta};
pub use signature::{hmac_sha256_hex, sha256_hex, AuthProof};

/// Header naming the streaming endpoint's host.
pub const HEADER_ORIGIN: &str = "x-bridge-origin";
/// Header naming the bridge instance.
pub const HEADER_INSTANCE: &str = "x-agency-instance";
/// Header carrying the signing timestamp (unix milliseconds).
pub const HEADER_TIMESTAMP: &str = "x-agency-timestamp";
/// Header carrying the per-request nonce.
pub const HEADER_NONCE: &str = "x-agency-nonce";
/// Header carrying the hex SHA-256 of the body.
pub const HEADER_PAYLOAD_SHA256: &str = "x-agency-payload-sha256";
/// Header carrying the canonical string the signature covers.
pub const HEADER_CANONICAL: &str = "x-agency-canonical";
/// Header carrying the HMAC signature; omitted without a shared secret.
pub const HEADER_SIGNATURE: &str = "x-agency-signature";

/// Sends authenticated envelopes to the automation webhook.
pub struct Forwarder {
    client: Client,
    config: Arc<Config>,
}

impl Forwarder {
    pub fn new(client: Client, config: Arc<Config>) -> Self {
        Self { client, config }
    }

    /// Build, sign and send one envelope.
    ///
    /// Returns the webhook's response status; a non-success status is the
    /// caller's concern. The envelope is constructed fresh per event and
    /// dropped once the send completes.
    pub async fn forward(&self, event: EventFields) -> Result<StatusCode> {
        let envelope = Envelope {
            source: SourceMeta::from_config(&self.config),
            event,
        };

        let body = serde_json::to_vec(&envelope).context("Failed to serialize envelope")?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .to_string();
        let nonce = Uuid::new_v4().to_string();
        let proof = AuthProof::new(self.config.shared_secret.as_deref(), &body, timestamp, nonce);

        let mut request = self
            .client
            .post(&self.config.webhook_url)
            .timeout(self.config.request_timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(HEADER_ORIGIN, &self.config.origin_host)
            .header(HEADER_INSTANCE, &self.config.instance)
            .header(HEADER_TIMESTAMP, &proof.timestamp)
            .header(HEADER_NONCE, &proof.nonce)
            .header(HEADER_PAYLOAD_SHA256, &proof.payload_hash)
            .header(HEADER_CANONICAL, &proof.canonical);

        if let Some(signature) = &proof.signature {
            request = request.header(HEADER_SIGNATURE, signature);
        }

        let response = request
            .body(body)
            .send()
            .await
            .context("Webhook request failed")?;

        let status = response.status();
        info!(status = status.as_u16(), "webhook_forward_status");

        Ok(status)
    }
}
