//! Poller: background long-poll loop.
//!
//! DESIGN
//! ======
//! `start` spawns one task that owns the session triple. Each round issues a
//! single `a_check` request, publishes the decoded updates in array order,
//! then adopts the server's `ts`. Rounds never overlap.
//!
//! ERROR HANDLING
//! ==============
//! Transport, decode and expiry failures never escape the task. The stale
//! session is dropped, the loop sleeps on a capped exponential backoff, then
//! negotiates a fresh triple. `ts` is not advanced on a failed round.
//!
//! CANCELLATION
//! ============
//! Every await point (poll, negotiation, publish, backoff sleep) races the
//! cancellation token, so `stop` returns without waiting out the long-poll
//! window. A round interrupted before publishing keeps its old `ts`, so the
//! updates are redelivered after a restart instead of being dropped.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backoff::Backoff;
use super::negotiator::{Negotiator, scalar_to_string};
use super::transport::Transport;
use super::types::{Session, Update, UpdateMessage, UpdateObject, VkError};
use crate::config::VkConfig;
use crate::error::ErrorCode;

const BACKOFF_JITTER: f64 = 0.2;

// =============================================================================
// SINK
// =============================================================================

/// Downstream consumer of decoded updates.
///
/// `publish` is awaited before the next poll round starts, which is what
/// gives consumers per-round ordering.
#[async_trait::async_trait]
pub trait UpdateSink: Send + Sync {
    async fn publish(&self, updates: Vec<Update>);
}

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Long-poll `wait` parameter in seconds.
    pub wait_secs: u64,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl From<&VkConfig> for PollSettings {
    fn from(config: &VkConfig) -> Self {
        Self {
            wait_secs: config.wait_secs,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
        }
    }
}

// =============================================================================
// STATE MACHINE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Everything the spawned loop needs, cloned into the task.
#[derive(Clone)]
struct PollContext {
    transport: Arc<dyn Transport>,
    negotiator: Negotiator,
    sink: Arc<dyn UpdateSink>,
    settings: PollSettings,
}

pub struct Poller {
    ctx: PollContext,
    state: PollerState,
    /// Session parked while the loop is not running.
    session: Option<Session>,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<Option<Session>>>,
}

impl Poller {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        negotiator: Negotiator,
        session: Session,
        sink: Arc<dyn UpdateSink>,
        settings: PollSettings,
    ) -> Self {
        Self {
            ctx: PollContext { transport, negotiator, sink, settings },
            state: PollerState::Idle,
            session: Some(session),
            cancel: None,
            task: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Spawn the poll loop. No-op while already running.
    pub fn start(&mut self) {
        if matches!(self.state, PollerState::Running | PollerState::Stopping) {
            return;
        }

        let cancel = CancellationToken::new();
        let ctx = self.ctx.clone();
        let session = self.session.take();
        let token = cancel.clone();
        self.task = Some(tokio::spawn(async move { poll_loop(ctx, session, token).await }));
        self.cancel = Some(cancel);
        self.state = PollerState::Running;
    }

    /// Cancel the loop and wait for the task to exit. No-op unless running.
    pub async fn stop(&mut self) {
        if self.state != PollerState::Running {
            return;
        }
        self.state = PollerState::Stopping;

        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(session) => self.session = session,
                Err(e) => error!(error = %e, "poll task terminated abnormally"),
            }
        }

        self.state = PollerState::Stopped;
    }
}

// =============================================================================
// LOOP
// =============================================================================

async fn poll_loop(ctx: PollContext, mut session: Option<Session>, cancel: CancellationToken) -> Option<Session> {
    let mut backoff = Backoff::new(ctx.settings.backoff_base, ctx.settings.backoff_max, BACKOFF_JITTER);
    info!(wait_secs = ctx.settings.wait_secs, "poll loop started");

    loop {
        let mut current = match session.take() {
            Some(s) => s,
            None => {
                let negotiated = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = ctx.negotiator.negotiate() => result,
                };
                match negotiated {
                    Ok(s) => {
                        info!(server = %s.server, "long-poll session renegotiated");
                        s
                    }
                    Err(e) => {
                        warn!(error = %e, code = e.error_code(), attempt = backoff.attempt(), "renegotiation failed");
                        if !sleep_or_cancel(&cancel, backoff.next_delay()).await {
                            break;
                        }
                        continue;
                    }
                }
            }
        };

        let url = current.poll_url(ctx.settings.wait_secs);
        let polled = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                session = Some(current);
                break;
            }
            result = ctx.transport.get(&url) => result.and_then(|body| parse_poll(&body)),
        };

        match polled {
            Ok(PollOutcome::Updates { ts, updates }) => {
                backoff.reset();
                debug!(count = updates.len(), ts = %ts, "poll round complete");
                let published = tokio::select! {
                    biased;
                    () = cancel.cancelled() => false,
                    () = ctx.sink.publish(updates) => true,
                };
                if published {
                    current.ts = ts;
                }
                session = Some(current);
                if !published {
                    break;
                }
            }
            Ok(PollOutcome::Outdated { ts }) => {
                debug!(old_ts = %current.ts, ts = %ts, "event history outdated; adopting server ts");
                current.ts = ts;
                session = Some(current);
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), attempt = backoff.attempt(), "poll failed; renegotiating");
                if !sleep_or_cancel(&cancel, backoff.next_delay()).await {
                    break;
                }
            }
        }
    }

    info!("poll loop exited");
    session
}

/// Sleep for `delay`; returns `false` if cancelled first.
async fn sleep_or_cancel(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PollOutcome {
    Updates { ts: String, updates: Vec<Update> },
    /// `failed: 1`: history outdated; continue from the returned `ts`.
    Outdated { ts: String },
}

#[derive(Deserialize)]
struct RawUpdate {
    #[serde(rename = "type")]
    kind: String,
    object: RawObject,
}

#[derive(Deserialize)]
struct RawObject {
    message: RawMessage,
}

#[derive(Deserialize)]
struct RawMessage {
    from_id: i64,
    #[serde(default)]
    text: String,
    id: i64,
}

impl From<RawUpdate> for Update {
    fn from(raw: RawUpdate) -> Self {
        let m = raw.object.message;
        Self {
            kind: raw.kind,
            object: UpdateObject { message: UpdateMessage { from_id: m.from_id, text: m.text, id: m.id } },
        }
    }
}

pub(crate) fn parse_poll(body: &Value) -> Result<PollOutcome, VkError> {
    let ts = body.get("ts").and_then(scalar_to_string);

    if let Some(failed) = body.get("failed") {
        let code = failed.as_i64().unwrap_or_default();
        return match (code, ts) {
            (1, Some(ts)) => Ok(PollOutcome::Outdated { ts }),
            _ => Err(VkError::SessionExpired { code }),
        };
    }

    let Some(ts) = ts else {
        return Err(VkError::Decode("poll response missing ts".into()));
    };

    let updates = match body.get("updates") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(decode_update).collect(),
        Some(other) => return Err(VkError::Decode(format!("updates is not an array: {other}"))),
    };

    Ok(PollOutcome::Updates { ts, updates })
}

fn decode_update(raw: &Value) -> Option<Update> {
    match RawUpdate::deserialize(raw) {
        Ok(update) => Some(update.into()),
        Err(e) => {
            let kind = raw.get("type").and_then(Value::as_str).unwrap_or("?");
            debug!(kind, error = %e, "skipping non-message update");
            None
        }
    }
}

#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;
