//! Bot worker: consumes relay updates and answers inbound messages.
//!
//! DESIGN
//! ======
//! The poller publishes each round into a bounded channel (`ChannelSink`).
//! A single worker drains it in order and replies through `MessageSender`.
//! A full channel applies backpressure to the poller instead of dropping
//! rounds. The worker exits when every sink clone has been dropped.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::vk::{MessageSender, OutboundMessage, Update, UpdateSink};

pub const DEFAULT_UPDATE_QUEUE_CAPACITY: usize = 64;

/// `UpdateSink` that forwards whole rounds into an mpsc channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Vec<Update>>,
}

#[async_trait::async_trait]
impl UpdateSink for ChannelSink {
    async fn publish(&self, updates: Vec<Update>) {
        let count = updates.len();
        if self.tx.send(updates).await.is_err() {
            warn!(count, "bot worker gone; dropping update round");
        }
    }
}

/// Create the sink/receiver pair.
#[must_use]
pub fn channel(capacity: usize) -> (ChannelSink, mpsc::Receiver<Vec<Update>>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelSink { tx }, rx)
}

/// Decide how the bot answers one update.
#[must_use]
pub fn reply_for(update: &Update) -> Option<OutboundMessage> {
    if !update.is_message_new() {
        return None;
    }
    let message = &update.object.message;
    if message.text.trim().is_empty() {
        return None;
    }
    Some(OutboundMessage::new(message.from_id, message.text.clone()))
}

/// Spawn the worker. Returns a handle that completes once the channel closes.
pub fn spawn_bot_worker(mut rx: mpsc::Receiver<Vec<Update>>, sender: MessageSender) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(round) = rx.recv().await {
            handle_round(&sender, &round).await;
        }
        info!("bot worker stopped");
    })
}

async fn handle_round(sender: &MessageSender, round: &[Update]) {
    for update in round {
        let Some(reply) = reply_for(update) else {
            debug!(kind = %update.kind, "update ignored");
            continue;
        };
        if let Err(e) = sender.send(&reply).await {
            warn!(error = %e, code = e.error_code(), user_id = reply.user_id, "reply failed");
        }
    }
}

#[cfg(test)]
#[path = "bot_test.rs"]
mod tests;
