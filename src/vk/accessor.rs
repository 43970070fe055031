//! VK API accessor: lifecycle owner for the relay.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` calls `connect` once at startup and `disconnect` during graceful
//! shutdown. A failed initial negotiation is the only relay error that
//! reaches the host; everything after that is absorbed by the poller.

use std::sync::Arc;

use tracing::{error, info};

use super::negotiator::Negotiator;
use super::poller::{PollSettings, Poller, PollerState, UpdateSink};
use super::sender::MessageSender;
use super::transport::{HttpTransport, Transport};
use super::types::VkError;
use crate::config::{BotConfig, VkConfig};
use crate::error::ErrorCode;

pub struct VkApiAccessor {
    bot: BotConfig,
    vk: VkConfig,
    sink: Arc<dyn UpdateSink>,
    transport: Option<Arc<dyn Transport>>,
    poller: Option<Poller>,
}

impl VkApiAccessor {
    #[must_use]
    pub fn new(bot: BotConfig, vk: VkConfig, sink: Arc<dyn UpdateSink>) -> Self {
        Self { bot, vk, sink, transport: None, poller: None }
    }

    /// Build the HTTP transport, negotiate a session and start polling.
    ///
    /// # Errors
    ///
    /// Returns the transport-build or negotiation error. Nothing is left
    /// running in that case.
    pub async fn connect(&mut self) -> Result<(), VkError> {
        if self.is_connected() {
            return Ok(());
        }
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&self.vk)?);
        self.connect_with(transport).await
    }

    /// Same as [`connect`](Self::connect) with a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns the negotiation error; the transport is released.
    pub async fn connect_with(&mut self, transport: Arc<dyn Transport>) -> Result<(), VkError> {
        if self.is_connected() {
            return Ok(());
        }

        let negotiator = Negotiator::new(Arc::clone(&transport), self.vk.api_base.clone(), &self.bot);
        let session = match negotiator.negotiate().await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, code = e.error_code(), group_id = self.bot.group_id, "vk long-poll negotiation failed");
                return Err(e);
            }
        };

        let mut poller = Poller::new(
            Arc::clone(&transport),
            negotiator,
            session,
            Arc::clone(&self.sink),
            PollSettings::from(&self.vk),
        );
        poller.start();

        self.transport = Some(transport);
        self.poller = Some(poller);
        info!(group_id = self.bot.group_id, "vk relay connected");
        Ok(())
    }

    /// Stop the poller, wait for it to exit, then release the transport.
    /// Safe to call repeatedly or after a failed `connect`.
    pub async fn disconnect(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop().await;
        }
        if self.transport.take().is_some() {
            info!(group_id = self.bot.group_id, "vk relay disconnected");
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    #[must_use]
    pub fn poller_state(&self) -> Option<PollerState> {
        self.poller.as_ref().map(Poller::state)
    }

    /// Sender bound to the live transport; `None` while disconnected.
    #[must_use]
    pub fn sender(&self) -> Option<MessageSender> {
        self.transport
            .as_ref()
            .map(|t| MessageSender::new(Arc::clone(t), self.vk.api_base.clone(), self.bot.token.clone()))
    }
}

#[cfg(test)]
#[path = "accessor_test.rs"]
mod tests;
