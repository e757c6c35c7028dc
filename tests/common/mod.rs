//! Shared test helpers: scripted run source, recording wallet, event builders.
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use cryptochat_core::error::{ChatError, Result};
use cryptochat_core::run_source::{RunEventStream, RunInput, RunSource};
use cryptochat_core::types::{ConversationEntry, RunEvent, RunEventKind};
use cryptochat_core::wallet::{ChainId, Notice, WalletBridge};

pub const RUN_ID: &str = "run-1";

/// A run source that replays canned events.
pub struct ScriptedRunSource {
    events: Mutex<Vec<Result<RunEvent>>>,
    pending: Mutex<Option<mpsc::UnboundedReceiver<Result<RunEvent>>>>,
    share_url: Option<String>,
    pub inputs: Mutex<Vec<RunInput>>,
}

impl ScriptedRunSource {
    pub fn new(events: Vec<RunEvent>) -> Self {
        Self {
            events: Mutex::new(events.into_iter().map(Ok).collect()),
            pending: Mutex::new(None),
            share_url: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Events followed by a transport failure.
    pub fn failing_after(events: Vec<RunEvent>, message: &str) -> Self {
        let source = Self::new(events);
        source
            .events
            .lock()
            .unwrap()
            .push(Err(ChatError::Stream(message.to_string())));
        source
    }

    /// A stream fed by the returned sender; it stays open while the sender lives.
    pub fn open_ended() -> (Self, mpsc::UnboundedSender<Result<RunEvent>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self::new(Vec::new());
        *source.pending.lock().unwrap() = Some(rx);
        (source, tx)
    }

    pub fn with_share_url(mut self, url: &str) -> Self {
        self.share_url = Some(url.to_string());
        self
    }
}

#[async_trait]
impl RunSource for ScriptedRunSource {
    async fn open_run(&self, input: &RunInput, _cancel: CancellationToken) -> Result<RunEventStream> {
        self.inputs.lock().unwrap().push(input.clone());
        if let Some(rx) = self.pending.lock().unwrap().take() {
            return Ok(UnboundedReceiverStream::new(rx).boxed());
        }
        let events = std::mem::take(&mut *self.events.lock().unwrap());
        Ok(futures::stream::iter(events).boxed())
    }

    async fn share_run(&self, run_id: &str) -> Result<String> {
        match &self.share_url {
            Some(url) => Ok(format!("{url}/{run_id}")),
            None => Err(ChatError::api(404, "sharing disabled")),
        }
    }
}

/// Wallet bridge that records every request and always switches.
#[derive(Default)]
pub struct RecordingWallet {
    pub connected: Mutex<Option<ChainId>>,
    pub switches: Mutex<Vec<ChainId>>,
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingWallet {
    pub fn connected_to(chain: &str) -> Self {
        let wallet = Self::default();
        *wallet.connected.lock().unwrap() = Some(ChainId::new(chain));
        wallet
    }
}

impl WalletBridge for RecordingWallet {
    fn connected_chain(&self) -> Option<ChainId> {
        self.connected.lock().unwrap().clone()
    }

    fn switch_network(&self, chain: &ChainId) -> bool {
        self.switches.lock().unwrap().push(chain.clone());
        *self.connected.lock().unwrap() = Some(chain.clone());
        true
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub fn token(node: &str, message_id: &str, text: &str) -> RunEvent {
    RunEvent::new(
        RunEventKind::TokenDelta,
        node,
        RUN_ID,
        json!({"chunk": {"id": message_id, "content": text}}),
    )
}

pub fn node_start(node: &str) -> RunEvent {
    RunEvent::new(RunEventKind::NodeStart, node, RUN_ID, json!({}))
}

pub fn node_end(node: &str) -> RunEvent {
    RunEvent::new(RunEventKind::NodeEnd, node, RUN_ID, json!({}))
}

/// Tool result whose content is `payload` encoded as a JSON string. The
/// tool message carries its own id besides the call id, as the runtime's do.
pub fn tool_end(name: &str, call_id: &str, payload: Value) -> RunEvent {
    RunEvent::new(
        RunEventKind::ToolResult,
        name,
        RUN_ID,
        json!({"output": {
            "content": payload.to_string(),
            "tool_call_id": call_id,
            "id": tool_message_id(call_id),
            "name": name
        }}),
    )
}

/// Stored id of the tool message answering `call_id`.
pub fn tool_message_id(call_id: &str) -> String {
    format!("tool-msg-{call_id}")
}

/// Progress ids are generated; compare everything else.
pub fn without_progress_ids(entries: &[ConversationEntry]) -> Vec<ConversationEntry> {
    entries
        .iter()
        .map(|entry| match entry {
            ConversationEntry::Progress(p) => ConversationEntry::progress("", p.label.clone(), p.percent),
            other => other.clone(),
        })
        .collect()
}

pub fn progress_percents(entries: &[ConversationEntry]) -> Vec<(String, u8)> {
    entries
        .iter()
        .filter_map(|e| e.as_progress().map(|p| (p.label.clone(), p.percent)))
        .collect()
}
