//! Inbound frame classification.
//!
//! Decides, for one decoded frame, whether it acknowledges authentication,
//! gets discarded, or becomes an event to forward. Self-authored posts and
//! ids already seen by the deduplicator are discarded here.

use std::time::Instant;

use serde_json::Value;
use uuid::Uuid;

use crate::dedup::Deduplicator;
use crate::forward::EventFields;
use crate::mattermost::{ChatPost, InboundFrame, EVENT_POSTED};

/// Outcome of inspecting one inbound frame.
#[derive(Debug)]
pub enum FrameOutcome {
    /// The backend acknowledged our authentication challenge.
    AuthAck { seq_reply: i64 },
    /// Nothing to do: unparseable, wrong event type, self-authored, or a
    /// duplicate.
    Discarded,
    /// A new post to hand to the forwarder.
    Forward(EventFields),
}

/// Classify a frame and, for a new post, build its event fields.
///
/// A `posted` frame whose embedded payload fails to decode is treated as an
/// empty post: it still flows through with a synthesized id, which means it
/// can never be deduplicated against later arrivals.
pub fn evaluate_frame(
    raw: &Value,
    bot_id: &str,
    dedup: &Deduplicator,
    now: Instant,
) -> FrameOutcome {
    let frame: InboundFrame = match serde_json::from_value(raw.clone()) {
        Ok(frame) => frame,
        Err(_) => return FrameOutcome::Discarded,
    };

    if frame.is_auth_ack() {
        return FrameOutcome::AuthAck {
            seq_reply: frame.seq_reply.unwrap_or_default(),
        };
    }

    if frame.event.as_deref() != Some(EVENT_POSTED) {
        return FrameOutcome::Discarded;
    }

    let data = frame.data.unwrap_or_default();
    let post: ChatPost = data
        .post
        .as_deref()
        .and_then(|encoded| serde_json::from_str(encoded).ok())
        .unwrap_or_default();

    if post.user_id == bot_id {
        return FrameOutcome::Discarded;
    }

    let post_id = if post.id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        post.id.clone()
    };

    if !dedup.admit(&post_id, now) {
        return FrameOutcome::Discarded;
    }

    FrameOutcome::Forward(EventFields {
        user_id: none_if_empty(post.user_id),
        channel_id: none_if_empty(post.channel_id),
        post_id,
        text: post.message,
        team_id: frame
            .broadcast
            .and_then(|b| b.team_id)
            .and_then(none_if_empty),
        sender_name: data.sender_name.and_then(none_if_empty),
        raw: raw.clone(),
    })
}

/// Empty strings become explicit nulls in the envelope.
fn none_if_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
