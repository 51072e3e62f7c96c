//! Agency Bridge - resilient Mattermost-to-webhook relay.
//!
//! Holds a persistent websocket connection to a Mattermost-compatible
//! backend, filters and de-duplicates `posted` events, and relays each one
//! to an automation webhook as a signed JSON envelope. Reconnects forever.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bridge::{supervisor, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    tracing::info!("bridge_starting");

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        ws_url = %config.ws_url,
        webhook_url = %config.webhook_url,
        instance = %config.instance,
        reconnect_ms = config.reconnect_delay.as_millis() as u64,
        dedup_ttl_ms = config.dedup_ttl.as_millis() as u64,
        signing_enabled = config.shared_secret.is_some(),
        "config_loaded"
    );

    supervisor::run(config).await
}
