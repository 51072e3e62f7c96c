//! Outbound envelope types.
//!
//! The webhook body is a source-metadata block merged with the event fields
//! at the top level. Missing post fields are sent as explicit JSON nulls.

use serde::Serialize;
use serde_json::Value;

use crate::config::Config;

/// Where this event came from, for multi-instance receivers.
#[derive(Debug, Clone, Serialize)]
pub struct SourceMeta {
    /// Hostname of the streaming endpoint
    pub host: String,
    /// HTTP base URL of the backend
    pub base_url: String,
    /// Streaming endpoint URL
    pub ws_url: String,
    /// Instance name of this bridge
    pub instance: String,
}

impl SourceMeta {
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.origin_host.clone(),
            base_url: config.base_url.clone(),
            ws_url: config.ws_url.clone(),
            instance: config.instance.clone(),
        }
    }
}

/// Event fields extracted from one admitted `posted` frame.
#[derive(Debug, Clone, Serialize)]
pub struct EventFields {
    /// Author of the post
    pub user_id: Option<String>,
    /// Channel the post landed in
    pub channel_id: Option<String>,
    /// Post id (synthesized when the post carried none)
    pub post_id: String,
    /// Message text
    pub text: String,
    /// Team id from the frame's broadcast scope
    pub team_id: Option<String>,
    /// Display name of the sender
    pub sender_name: Option<String>,
    /// The complete inbound frame, for traceability
    pub raw: Value,
}

/// The full webhook body: source block plus event fields, flattened.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub source: SourceMeta,
    #[serde(flatten)]
    pub event: EventFields,
}
