//! Outbound messages via `messages.send`.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use super::build_query;
use super::transport::Transport;
use super::types::{OutboundMessage, VkError};

const METHOD: &str = "messages.send";

/// Fire-and-forget message delivery sharing the accessor's transport.
#[derive(Clone)]
pub struct MessageSender {
    transport: Arc<dyn Transport>,
    api_base: String,
    token: String,
}

impl MessageSender {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self { transport, api_base: api_base.into(), token: token.into() }
    }

    /// Send one message. Not retried.
    ///
    /// # Errors
    ///
    /// Returns [`VkError::Transport`] when the HTTP call itself fails. An
    /// undecodable or error-carrying response body is logged and ignored.
    pub async fn send(&self, message: &OutboundMessage) -> Result<(), VkError> {
        let url = build_query(
            &self.api_base,
            METHOD,
            &[
                ("user_id", message.user_id.to_string()),
                ("message", message.text.clone()),
                ("random_id", generate_random_id().to_string()),
                ("access_token", self.token.clone()),
            ],
        )?;

        match self.transport.post(&url).await {
            Ok(body) => {
                if let Some(error) = body.get("error") {
                    warn!(user_id = message.user_id, error = %error, "messages.send rejected by platform");
                } else {
                    debug!(user_id = message.user_id, "message sent");
                }
                Ok(())
            }
            Err(VkError::Decode(e)) => {
                warn!(user_id = message.user_id, error = %e, "messages.send response not decodable");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Per-message deduplication token. VK expects a signed 32-bit value.
pub(crate) fn generate_random_id() -> i32 {
    rand::rng().random_range(1..=i32::MAX)
}

#[cfg(test)]
#[path = "sender_test.rs"]
mod tests;
