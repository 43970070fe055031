//! Long-poll session negotiation via `groups.getLongPollServer`.
//!
//! Parsing is split into `parse_session` so the envelope rules can be
//! tested without a transport.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::build_query;
use super::transport::Transport;
use super::types::{Session, VkError};
use crate::config::BotConfig;

const METHOD: &str = "groups.getLongPollServer";

/// Obtains fresh `{server, key, ts}` triples for one community.
#[derive(Clone)]
pub struct Negotiator {
    transport: Arc<dyn Transport>,
    api_base: String,
    group_id: i64,
    token: String,
}

impl Negotiator {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, api_base: impl Into<String>, bot: &BotConfig) -> Self {
        Self { transport, api_base: api_base.into(), group_id: bot.group_id, token: bot.token.clone() }
    }

    /// Request a new long-poll session.
    ///
    /// # Errors
    ///
    /// Transport and decode failures pass through unchanged; a response
    /// without a usable `response` envelope is [`VkError::Negotiation`].
    pub async fn negotiate(&self) -> Result<Session, VkError> {
        let url = build_query(
            &self.api_base,
            METHOD,
            &[("group_id", self.group_id.to_string()), ("access_token", self.token.clone())],
        )?;
        let body = self.transport.get(&url).await?;
        let session = parse_session(&body)?;
        debug!(server = %session.server, ts = %session.ts, "long-poll session negotiated");
        Ok(session)
    }
}

/// Extract the session triple from a `getLongPollServer` response body.
pub(crate) fn parse_session(body: &Value) -> Result<Session, VkError> {
    if let Some(error) = body.get("error") {
        let code = error.get("error_code").and_then(Value::as_i64).unwrap_or_default();
        let msg = error
            .get("error_msg")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(VkError::Negotiation(format!("platform error {code}: {msg}")));
    }

    let Some(response) = body.get("response") else {
        return Err(VkError::Negotiation("missing response envelope".into()));
    };

    let field = |name: &str| {
        response
            .get(name)
            .and_then(scalar_to_string)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| VkError::Negotiation(format!("response missing {name}")))
    };

    Ok(Session { server: field("server")?, key: field("key")?, ts: field("ts")? })
}

/// VK sends `ts` as a string in some responses and as a number in others.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "negotiator_test.rs"]
mod tests;
