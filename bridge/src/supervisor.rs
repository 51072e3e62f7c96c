//! Top-level control loop.
//!
//! Resolves the bot's identity once (fatal on failure), then runs sessions
//! forever: each closed or failed session is followed by a fixed delay and
//! a fresh connect attempt. There is no attempt limit; the bridge is meant
//! to ride out arbitrarily long backend outages. SIGINT/SIGTERM end the
//! loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::signal;
use tokio::time::sleep;
use tracing::{error, info};

use crate::config::Config;
use crate::dedup::Deduplicator;
use crate::forward::Forwarder;
use crate::mattermost::resolve_bot_id;
use crate::session;

/// Run the bridge until a shutdown signal arrives.
///
/// Identity resolution happens before the first session; if it fails the
/// error propagates out and the process exits, since self-message
/// suppression cannot work without it.
pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);

    // One pooled client shared by identity lookup and every forward
    let client = Client::builder()
        .pool_max_idle_per_host(100)
        .build()
        .context("Failed to create HTTP client")?;

    let bot_id = resolve_bot_id(&client, &config)
        .await
        .context("Failed to resolve bot identity")?;

    info!(
        bot_id = %bot_id,
        ws_url = %config.ws_url,
        webhook_url = %config.webhook_url,
        "bridge_identity_resolved"
    );

    let dedup = Arc::new(Deduplicator::new(config.dedup_ttl));
    let _sweeper = Arc::clone(&dedup).spawn_sweeper();

    let forwarder = Arc::new(Forwarder::new(client, Arc::clone(&config)));

    // Create shutdown signal future
    let shutdown = async {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received SIGINT"),
            _ = terminate => info!("Received SIGTERM"),
        }
    };

    // Pin the shutdown future
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("bridge_stopping");
                break;
            }
            result = session::run(&config, &bot_id, &dedup, &forwarder) => {
                match result {
                    Ok(reason) => info!(reason = %reason, "session_closed"),
                    Err(e) => error!(error = %e, "session_failed"),
                }
            }
        }

        info!(
            delay_ms = config.reconnect_delay.as_millis() as u64,
            "session_reconnect_scheduled"
        );

        tokio::select! {
            _ = &mut shutdown => {
                info!("bridge_stopping");
                break;
            }
            _ = sleep(config.reconnect_delay) => {}
        }
    }

    info!("bridge_shutdown_complete");
    Ok(())
}
