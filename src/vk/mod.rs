//! VK relay: long-poll bridge between the VK Bots API and the bot worker.
//!
//! ARCHITECTURE
//! ============
//! `VkApiAccessor` owns the lifecycle. On `connect` it builds the transport,
//! negotiates a `{server, key, ts}` session, and starts a `Poller` task that
//! publishes decoded updates to an `UpdateSink`. `MessageSender` shares the
//! same transport for outbound replies.
//!
//! DESIGN
//! ======
//! The session triple lives inside the poll task and is handed back through
//! its `JoinHandle` on stop. Only that task touches it, so no lock is needed.

pub mod accessor;
pub mod backoff;
pub mod negotiator;
pub mod poller;
pub mod sender;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use accessor::VkApiAccessor;
pub use poller::UpdateSink;
pub use sender::MessageSender;
pub use types::{OutboundMessage, Update, VkError};

/// VK API version sent as `v` on every method call.
pub const API_VERSION: &str = "5.131";

/// Build `{base}/{method}?{params}&v=API_VERSION`, URL-encoding each value.
///
/// # Errors
///
/// Returns [`VkError::Transport`] if `base` is not a valid URL.
pub fn build_query(base: &str, method: &str, params: &[(&str, String)]) -> Result<String, VkError> {
    let endpoint = format!("{}/{method}", base.trim_end_matches('/'));
    let pairs = params
        .iter()
        .map(|(k, v)| (*k, v.as_str()))
        .chain(std::iter::once(("v", API_VERSION)));
    let url = reqwest::Url::parse_with_params(&endpoint, pairs)
        .map_err(|e| VkError::Transport(format!("invalid api url {endpoint}: {e}")))?;
    Ok(url.into())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
