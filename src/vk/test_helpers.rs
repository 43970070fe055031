//! Scripted transport and recording sink for relay tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{Value, json};
use tokio::time::{Duration, Instant, sleep};

use super::poller::UpdateSink;
use super::transport::Transport;
use super::types::{Update, VkError};
use crate::config::{BotConfig, VkConfig};

pub const TEST_API_BASE: &str = "https://api.test/method";
pub const TEST_SERVER: &str = "https://lp.test/wh1";

#[must_use]
pub fn bot_config() -> BotConfig {
    BotConfig { group_id: 42, token: "tok".into() }
}

/// Fast backoff so failure-path tests finish quickly.
#[must_use]
pub fn vk_config() -> VkConfig {
    VkConfig {
        api_base: TEST_API_BASE.into(),
        wait_secs: 25,
        request_timeout_secs: 35,
        connect_timeout_secs: 1,
        backoff_base_ms: 1,
        backoff_max_ms: 5,
    }
}

#[must_use]
pub fn session_body(server: &str, key: &str, ts: &str) -> Value {
    json!({ "response": { "server": server, "key": key, "ts": ts } })
}

#[must_use]
pub fn message_update(from_id: i64, text: &str, id: i64) -> Value {
    json!({
        "type": "message_new",
        "object": { "message": { "from_id": from_id, "text": text, "id": id } },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Negotiate,
    Poll,
    Send,
}

fn classify(url: &str) -> CallKind {
    if url.contains("groups.getLongPollServer") {
        CallKind::Negotiate
    } else if url.contains("messages.send") {
        CallKind::Send
    } else {
        CallKind::Poll
    }
}

#[derive(Default)]
struct Script {
    negotiate: VecDeque<Result<Value, VkError>>,
    poll: VecDeque<Result<Value, VkError>>,
    send: VecDeque<Result<Value, VkError>>,
}

/// Transport that replays queued responses per endpoint.
///
/// When a queue runs dry the call never completes, like a long-poll with
/// nothing to deliver.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<Script>,
    calls: Mutex<Vec<(CallKind, String)>>,
}

impl MockTransport {
    pub fn push(&self, kind: CallKind, response: Result<Value, VkError>) {
        let mut script = self.script.lock().expect("script mutex should lock");
        match kind {
            CallKind::Negotiate => script.negotiate.push_back(response),
            CallKind::Poll => script.poll.push_back(response),
            CallKind::Send => script.send.push_back(response),
        }
    }

    #[must_use]
    pub fn calls(&self, kind: CallKind) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls mutex should lock")
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, url)| url.clone())
            .collect()
    }

    /// Wait until at least `n` calls of `kind` were issued.
    pub async fn wait_for_calls(&self, kind: CallKind, n: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let calls = self.calls(kind);
            if calls.len() >= n {
                return calls;
            }
            assert!(Instant::now() < deadline, "timed out waiting for {n} {kind:?} calls, saw {}", calls.len());
            sleep(Duration::from_millis(5)).await;
        }
    }

    async fn dispatch(&self, url: &str) -> Result<Value, VkError> {
        let kind = classify(url);
        self.calls
            .lock()
            .expect("calls mutex should lock")
            .push((kind, url.to_owned()));

        let next = {
            let mut script = self.script.lock().expect("script mutex should lock");
            match kind {
                CallKind::Negotiate => script.negotiate.pop_front(),
                CallKind::Poll => script.poll.pop_front(),
                CallKind::Send => script.send.pop_front(),
            }
        };

        match next {
            Some(response) => response,
            None => std::future::pending().await,
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<Value, VkError> {
        self.dispatch(url).await
    }

    async fn post(&self, url: &str) -> Result<Value, VkError> {
        self.dispatch(url).await
    }
}

/// Sink that records every published round.
#[derive(Default)]
pub struct RecordingSink {
    rounds: Mutex<Vec<Vec<Update>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn rounds(&self) -> Vec<Vec<Update>> {
        self.rounds.lock().expect("rounds mutex should lock").clone()
    }

    pub async fn wait_for_rounds(&self, n: usize) -> Vec<Vec<Update>> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let rounds = self.rounds();
            if rounds.len() >= n {
                return rounds;
            }
            assert!(Instant::now() < deadline, "timed out waiting for {n} rounds, saw {}", rounds.len());
            sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait::async_trait]
impl UpdateSink for RecordingSink {
    async fn publish(&self, updates: Vec<Update>) {
        self.rounds
            .lock()
            .expect("rounds mutex should lock")
            .push(updates);
    }
}
