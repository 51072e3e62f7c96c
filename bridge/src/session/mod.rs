//! One live streaming connection.
//!
//! A session connects, sends the authentication challenge, then serves a
//! select loop over inbound frames and heartbeat probe ticks until the
//! connection dies. Frame-level problems never end the session; only
//! transport events and heartbeat staleness do. The close reason is handed
//! back to the supervisor, which decides when to reconnect.

pub mod events;
pub mod heartbeat;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http, Message},
};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dedup::Deduplicator;
use crate::forward::Forwarder;
use crate::mattermost::AuthChallenge;

pub use events::{evaluate_frame, FrameOutcome};
pub use heartbeat::Heartbeat;

/// Why a session ended.
#[derive(Debug)]
pub enum CloseReason {
    /// The peer sent a close frame.
    PeerClosed { code: Option<u16>, reason: String },
    /// The stream ended without a close frame.
    StreamEnded,
    /// A read or write on the connection failed.
    TransportError(String),
    /// No pong arrived within the staleness threshold.
    HeartbeatTimeout,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::PeerClosed { code, reason } => match code {
                Some(code) => write!(f, "peer closed ({code}) {reason}"),
                None => write!(f, "peer closed"),
            },
            CloseReason::StreamEnded => write!(f, "stream ended"),
            CloseReason::TransportError(msg) => write!(f, "transport error: {msg}"),
            CloseReason::HeartbeatTimeout => write!(f, "heartbeat timeout"),
        }
    }
}

/// Run one connection to completion.
///
/// Errors are returned only for failures before the frame loop starts
/// (connect or challenge send); once the loop is running every exit is a
/// `CloseReason`.
pub async fn run(
    config: &Config,
    bot_id: &str,
    dedup: &Arc<Deduplicator>,
    forwarder: &Arc<Forwarder>,
) -> Result<CloseReason> {
    let mut request = config
        .ws_url
        .as_str()
        .into_client_request()
        .context("Invalid streaming URL")?;
    request.headers_mut().insert(
        http::header::USER_AGENT,
        http::HeaderValue::from_str(&format!("AgencyBot/{}", config.instance))
            .context("Instance name is not a valid header value")?,
    );

    info!(ws_url = %config.ws_url, "ws_connecting");

    let (stream, _response) = connect_async(request)
        .await
        .context("Failed to open streaming connection")?;

    info!("ws_open");

    let (mut write, mut read) = stream.split();

    // The challenge is the first frame on the wire; the ack is advisory and
    // event frames are processed whether or not it has arrived yet.
    let challenge =
        serde_json::to_string(&AuthChallenge::new(&config.bot_token)).context("Challenge JSON")?;
    write
        .send(Message::Text(challenge.into()))
        .await
        .context("Failed to send authentication challenge")?;

    info!("ws_auth_challenge_sent");

    let mut heartbeat = Heartbeat::new(Instant::now());
    let mut probe = tokio::time::interval_at(
        tokio::time::Instant::now() + heartbeat.probe_interval(),
        heartbeat.probe_interval(),
    );

    let reason = loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    handle_frame(text.as_str(), bot_id, dedup, forwarder);
                }
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(e) = write.send(Message::Pong(payload)).await {
                        break CloseReason::TransportError(e.to_string());
                    }
                }
                Some(Ok(Message::Pong(_))) => {
                    heartbeat.record_ack(Instant::now());
                }
                Some(Ok(Message::Close(frame))) => {
                    break CloseReason::PeerClosed {
                        code: frame.as_ref().map(|f| u16::from(f.code)),
                        reason: frame
                            .map(|f| f.reason.to_string())
                            .unwrap_or_default(),
                    };
                }
                Some(Ok(_)) => {} // binary and raw frames are not part of the protocol
                Some(Err(e)) => break CloseReason::TransportError(e.to_string()),
                None => break CloseReason::StreamEnded,
            },
            _ = probe.tick() => {
                if heartbeat.is_stale(Instant::now()) {
                    warn!("ws_heartbeat_timeout");
                    break CloseReason::HeartbeatTimeout;
                }
                if let Err(e) = write.send(Message::Ping(Vec::new().into())).await {
                    break CloseReason::TransportError(e.to_string());
                }
            }
        }
    };

    // The probe timer and heartbeat state die with this frame, on every
    // exit path.
    Ok(reason)
}

/// Process one text frame.
///
/// Forwarding runs as a detached task: its outcome is logged and never
/// feeds back into the frame loop.
fn handle_frame(text: &str, bot_id: &str, dedup: &Deduplicator, forwarder: &Arc<Forwarder>) {
    let raw: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return, // undecodable frames are dropped
    };

    match evaluate_frame(&raw, bot_id, dedup, Instant::now()) {
        FrameOutcome::AuthAck { seq_reply } => {
            info!(seq_reply = seq_reply, "ws_auth_ok");
        }
        FrameOutcome::Discarded => {}
        FrameOutcome::Forward(fields) => {
            let post_id = fields.post_id.clone();
            let forwarder = Arc::clone(forwarder);

            tokio::spawn(async move {
                match forwarder.forward(fields).await {
                    Ok(status) if !status.is_success() => {
                        warn!(
                            post_id = %post_id,
                            status = status.as_u16(),
                            "webhook_forward_rejected"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(post_id = %post_id, error = %e, "webhook_forward_failed");
                    }
                }
            });
        }
    }
}
