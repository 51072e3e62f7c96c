//! Mattermost wire contracts.
//!
//! Types for the websocket frames the backend sends, the authentication
//! challenge the bridge sends first, and the one-time identity lookup.

pub mod identity;
pub mod types;

pub use identity::resolve_bot_id;
pub use types::{AuthChallenge, Broadcast, ChatPost, FrameData, InboundFrame, EVENT_POSTED};
