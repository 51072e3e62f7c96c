//! Frame and post types exchanged over the streaming connection.
//!
//! Inbound frames are decoded tolerantly: every field is optional, and a
//! `posted` frame's embedded post is itself a JSON-encoded string that may
//! be absent or malformed.

use serde::{Deserialize, Serialize};

/// The only event type the bridge acts on.
pub const EVENT_POSTED: &str = "posted";

/// Status marker of a successful authentication acknowledgment.
pub const AUTH_STATUS_OK: &str = "OK";

/// First frame sent after the connection opens.
#[derive(Debug, Serialize)]
pub struct AuthChallenge {
    seq: u32,
    action: &'static str,
    data: AuthChallengeData,
}

#[derive(Debug, Serialize)]
struct AuthChallengeData {
    token: String,
}

impl AuthChallenge {
    pub fn new(token: &str) -> Self {
        Self {
            seq: 1,
            action: "authentication_challenge",
            data: AuthChallengeData {
                token: token.to_string(),
            },
        }
    }
}

/// A decoded server frame. Unrecognized fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct InboundFrame {
    /// Status of a request acknowledgment (`"OK"` on auth success)
    #[serde(default)]
    pub status: Option<String>,

    /// Sequence number the acknowledgment replies to
    #[serde(default)]
    pub seq_reply: Option<i64>,

    /// Event type discriminator for event notifications
    #[serde(default)]
    pub event: Option<String>,

    /// Event-specific payload
    #[serde(default)]
    pub data: Option<FrameData>,

    /// Delivery scope metadata
    #[serde(default)]
    pub broadcast: Option<Broadcast>,
}

impl InboundFrame {
    /// Whether this frame acknowledges the authentication challenge.
    pub fn is_auth_ack(&self) -> bool {
        self.status.as_deref() == Some(AUTH_STATUS_OK) && self.seq_reply.is_some()
    }
}

/// Payload of an event frame.
#[derive(Debug, Default, Deserialize)]
pub struct FrameData {
    /// JSON-encoded post, present on `posted` events
    #[serde(default)]
    pub post: Option<String>,

    /// Display name of the sender
    #[serde(default)]
    pub sender_name: Option<String>,
}

/// Delivery scope of an event frame.
#[derive(Debug, Default, Deserialize)]
pub struct Broadcast {
    /// Team the event was broadcast to; empty for direct messages
    #[serde(default)]
    pub team_id: Option<String>,
}

/// A chat post decoded from a `posted` frame's embedded payload.
///
/// All fields default to empty strings so a partial payload decodes rather
/// than failing the frame.
#[derive(Debug, Default, Deserialize)]
pub struct ChatPost {
    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub channel_id: String,

    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_challenge_wire_shape() {
        let json = serde_json::to_value(AuthChallenge::new("tok-1")).unwrap();
        assert_eq!(json["seq"], 1);
        assert_eq!(json["action"], "authentication_challenge");
        assert_eq!(json["data"]["token"], "tok-1");
    }

    #[test]
    fn test_auth_ack_frame() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"status":"OK","seq_reply":1}"#).unwrap();
        assert!(frame.is_auth_ack());
        assert_eq!(frame.seq_reply, Some(1));
    }

    #[test]
    fn test_non_ok_status_is_not_an_ack() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"status":"FAIL","seq_reply":1}"#).unwrap();
        assert!(!frame.is_auth_ack());

        let frame: InboundFrame = serde_json::from_str(r#"{"status":"OK"}"#).unwrap();
        assert!(!frame.is_auth_ack());
    }

    #[test]
    fn test_posted_frame_decodes() {
        let json = r#"{
            "event": "posted",
            "data": {
                "post": "{\"id\":\"p1\",\"user_id\":\"u2\",\"channel_id\":\"c1\",\"message\":\"hi\"}",
                "sender_name": "@alice"
            },
            "broadcast": {"team_id": "t1"}
        }"#;

        let frame: InboundFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.event.as_deref(), Some(EVENT_POSTED));

        let data = frame.data.unwrap();
        let post: ChatPost = serde_json::from_str(data.post.as_deref().unwrap()).unwrap();
        assert_eq!(post.id, "p1");
        assert_eq!(post.user_id, "u2");
        assert_eq!(post.message, "hi");
        assert_eq!(data.sender_name.as_deref(), Some("@alice"));
        assert_eq!(frame.broadcast.unwrap().team_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_partial_post_decodes_with_defaults() {
        let post: ChatPost = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(post.message, "hi");
        assert!(post.id.is_empty());
        assert!(post.user_id.is_empty());
    }
}
