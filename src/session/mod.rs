//! The consumer loop and the conversation it owns.
//!
//! [`ChatSession`] is the only writer of the entry list. Renderers read it
//! through [`ChatSession::entries`] or a [`ChatSession::snapshot`].

pub mod share;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::assembler::MessageAssembler;
use crate::classify::{classify, Route};
use crate::dispatch::{dispatch_content, DispatchContext, Mode, ToolTable};
use crate::error::Result;
use crate::progress::ProgressTracker;
use crate::rehydrate::rehydrate_with;
use crate::run_source::{RunInput, RunSource};
use crate::types::{ConversationEntry, RunEvent, Thread};
use crate::wallet::{NoWallet, SideEffect, WalletBridge};

use self::share::{spawn_share_link, SharedLink};

/// How a run's event stream ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The stream ended. The runtime sends no terminal event, so this does
    /// not prove the run itself succeeded.
    Completed,
    Canceled,
    Failed,
}

/// Result of consuming one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: Option<String>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub events: usize,
    pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
    fn new(run_id: Option<String>, status: RunStatus, error: Option<String>, events: usize) -> Self {
        Self {
            run_id,
            status,
            error,
            events,
            finished_at: Utc::now(),
        }
    }
}

pub struct ChatSession {
    source: Arc<dyn RunSource>,
    wallet: Arc<dyn WalletBridge>,
    tools: ToolTable,
    assembler: MessageAssembler,
    progress: ProgressTracker,
    share_links: bool,
    generation: u64,
    share_tx: mpsc::UnboundedSender<SharedLink>,
    share_rx: mpsc::UnboundedReceiver<SharedLink>,
    last_share: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("entries", &self.assembler.len())
            .field("generation", &self.generation)
            .field("share_links", &self.share_links)
            .finish()
    }
}

impl ChatSession {
    pub fn new(source: Arc<dyn RunSource>) -> Self {
        let (share_tx, share_rx) = mpsc::unbounded_channel();
        Self {
            source,
            wallet: Arc::new(NoWallet),
            tools: ToolTable::default(),
            assembler: MessageAssembler::new(),
            progress: ProgressTracker::new(),
            share_links: true,
            generation: 0,
            share_tx,
            share_rx,
            last_share: None,
        }
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletBridge>) -> Self {
        self.wallet = wallet;
        self
    }

    pub fn with_tools(mut self, tools: ToolTable) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_share_links(mut self, enabled: bool) -> Self {
        self.share_links = enabled;
        self
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        self.assembler.entries()
    }

    pub fn snapshot(&self) -> Vec<ConversationEntry> {
        self.assembler.snapshot()
    }

    /// Handle of the most recent share-link lookup, if one was spawned.
    pub fn take_share_task(&mut self) -> Option<JoinHandle<()>> {
        self.last_share.take()
    }

    /// Start an empty conversation.
    pub fn clear(&mut self) {
        self.replace_conversation(Vec::new());
    }

    /// Replace the conversation with a persisted thread's history.
    pub fn load_thread(&mut self, thread: &Thread) {
        tracing::debug!(thread_id = %thread.id, messages = thread.stored_messages.len(), "loading thread");
        let entries = rehydrate_with(&self.tools, &thread.stored_messages);
        self.replace_conversation(entries);
    }

    fn replace_conversation(&mut self, entries: Vec<ConversationEntry>) {
        // Links still in flight belong to the old conversation.
        self.generation += 1;
        while self.share_rx.try_recv().is_ok() {}
        self.progress.reset();
        self.assembler.replace_all(entries);
    }

    /// Append share links that resolved since the last call.
    pub fn drain_share_links(&mut self) -> usize {
        let mut appended = 0;
        while let Ok(link) = self.share_rx.try_recv() {
            if link.generation == self.generation {
                self.assembler.push(link.entry);
                appended += 1;
            }
        }
        appended
    }

    /// Send one user turn and consume its run until the stream ends or
    /// `cancel` fires.
    pub async fn run(&mut self, input: RunInput, cancel: CancellationToken) -> Result<RunOutcome> {
        self.drain_share_links();
        self.progress.reset();
        self.assembler.push(ConversationEntry::user(input.message.clone()));

        let mut stream = self.source.open_run(&input, cancel.clone()).await?;
        let mut run_id: Option<String> = None;
        let mut events = 0usize;
        let mut failure: Option<String> = None;

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = stream.next() => next,
            };
            let Some(item) = next else { break };
            match item {
                Ok(event) => {
                    events += 1;
                    if run_id.is_none() && !event.run_id.is_empty() {
                        run_id = Some(event.run_id.clone());
                    }
                    self.handle_event(&event);
                }
                Err(e) => {
                    tracing::warn!(thread_id = %input.thread_id, error = %e, "run stream ended with an error");
                    failure = Some(e.to_string());
                    break;
                }
            }
        }
        self.assembler.finalize_streaming();

        let status = if cancel.is_cancelled() {
            RunStatus::Canceled
        } else if failure.is_some() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        tracing::debug!(run_id = ?run_id, events, ?status, "run stream finished");

        if status != RunStatus::Canceled && self.share_links {
            if let Some(id) = &run_id {
                self.last_share = Some(spawn_share_link(
                    Arc::clone(&self.source),
                    id.clone(),
                    self.generation,
                    self.share_tx.clone(),
                ));
            }
        }
        Ok(RunOutcome::new(run_id, status, failure, events))
    }

    /// Process one event to completion.
    pub fn handle_event(&mut self, event: &RunEvent) {
        for route in classify(event) {
            match route {
                Route::Text {
                    message_id,
                    fragment,
                } => {
                    self.assembler.append_text(&message_id, &fragment);
                }
                Route::TextNodeEnd => self.assembler.finalize_streaming(),
                Route::PhaseStart(phase) => {
                    if let Some(update) = self.progress.on_start(phase) {
                        self.assembler.apply_progress(update);
                    }
                }
                Route::PhaseEnd(phase) => {
                    let update = self.progress.on_end(phase);
                    self.assembler.apply_progress(update);
                }
                Route::Barrier => self.progress.on_barrier(),
                Route::Tool { name, id, content } => {
                    let ctx = DispatchContext::new(self.wallet.connected_chain());
                    let expansion =
                        dispatch_content(&self.tools, &name, &id, &content, &ctx, Mode::Live);
                    self.apply_effects(expansion.effects);
                    self.assembler.extend(expansion.entries);
                }
            }
        }
    }

    fn apply_effects(&self, effects: Vec<SideEffect>) {
        for effect in effects {
            match effect {
                SideEffect::SwitchNetwork(chain) => {
                    if !self.wallet.switch_network(&chain) {
                        tracing::warn!(chain = %chain, "wallet did not switch network");
                    }
                }
                SideEffect::Notify(notice) => self.wallet.notify(notice),
            }
        }
    }
}
