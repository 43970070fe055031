//! VK relay types: session triple, decoded updates, outbound messages, errors.
//!
//! Wire structs stay private to the modules that parse them; everything in
//! this file is the typed surface the rest of the crate sees.

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by the relay's network operations.
#[derive(Debug, thiserror::Error)]
pub enum VkError {
    /// Network failure or timeout talking to the platform.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the JSON we expected.
    #[error("decode error: {0}")]
    Decode(String),

    /// The long-poll session bootstrap did not yield a usable triple.
    #[error("long-poll negotiation failed: {0}")]
    Negotiation(String),

    /// The platform rejected the current session (`failed` code 2 or 3).
    #[error("long-poll session expired (failed={code})")]
    SessionExpired { code: i64 },
}

impl crate::error::ErrorCode for VkError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_VK_TRANSPORT",
            Self::Decode(_) => "E_VK_DECODE",
            Self::Negotiation(_) => "E_VK_NEGOTIATION",
            Self::SessionExpired { .. } => "E_VK_SESSION_EXPIRED",
        }
    }

    fn retryable(&self) -> bool {
        true
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Long-poll session triple issued by `groups.getLongPollServer`.
///
/// Owned by the poll loop. Never persisted; a reconnect negotiates a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Long-poll endpoint URL. Rotated by the platform on re-negotiation.
    pub server: String,
    /// Opaque session key.
    pub key: String,
    /// Update cursor. Echoed back on every poll as the acknowledgement.
    pub ts: String,
}

impl Session {
    /// Build the `a_check` URL for one long-poll round.
    #[must_use]
    pub fn poll_url(&self, wait_secs: u64) -> String {
        format!("{}?act=a_check&key={}&ts={}&wait={wait_secs}", self.server, self.key, self.ts)
    }
}

// =============================================================================
// UPDATES
// =============================================================================

/// One inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMessage {
    pub from_id: i64,
    pub text: String,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateObject {
    pub message: UpdateMessage,
}

/// A decoded long-poll event, e.g. `message_new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "type")]
    pub kind: String,
    pub object: UpdateObject,
}

/// Event type emitted for a new inbound message.
pub const MESSAGE_NEW: &str = "message_new";

impl Update {
    #[must_use]
    pub fn is_message_new(&self) -> bool {
        self.kind == MESSAGE_NEW
    }
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// A message the bot wants delivered to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub user_id: i64,
    pub text: String,
}

impl OutboundMessage {
    pub fn new(user_id: i64, text: impl Into<String>) -> Self {
        Self { user_id, text: text.into() }
    }
}
