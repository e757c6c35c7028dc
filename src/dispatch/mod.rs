//! Tool result dispatch, shared by the live stream and thread rehydration.
//!
//! [`expand`] is the single classification function both paths call, so a
//! tool renders the same whether it arrived live or from history. Live
//! sessions execute the returned side effects; replays discard them.

pub mod handlers;
pub mod payload;
pub mod table;

pub use payload::PayloadError;
pub use table::{ToolHandler, ToolTable};

use serde_json::Value;
use thiserror::Error;

use crate::types::ConversationEntry;
use crate::wallet::{ChainId, SideEffect};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("unsupported chain type `{0}`")]
    UnsupportedChain(String),
}

/// Which entry point is dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Live,
    Replay,
}

/// Wallet state visible to handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchContext {
    pub connected_chain: Option<ChainId>,
}

impl DispatchContext {
    pub fn new(connected_chain: Option<ChainId>) -> Self {
        Self { connected_chain }
    }

    /// Context for history replay, where effects are never executed.
    pub fn replay() -> Self {
        Self::default()
    }
}

/// Entries and side effects produced by one tool result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    pub entries: Vec<ConversationEntry>,
    pub effects: Vec<SideEffect>,
}

impl Expansion {
    pub fn entry(entry: ConversationEntry) -> Self {
        Self {
            entries: vec![entry],
            effects: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.effects.is_empty()
    }
}

/// Classify a parsed payload and expand it into entries and effects.
pub fn expand(
    table: &ToolTable,
    name: &str,
    id: &str,
    payload: Value,
    ctx: &DispatchContext,
    mode: Mode,
) -> Result<Expansion, DispatchError> {
    let Some(handler) = table.get(name) else {
        tracing::trace!(tool = name, "ignoring tool outside the dispatch table");
        return Ok(Expansion::default());
    };
    match handler {
        ToolHandler::Passthrough => Ok(handlers::passthrough(name, id, payload)),
        ToolHandler::UnwrapList => Ok(handlers::unwrap_list(name, id, payload)),
        ToolHandler::SourceList => Ok(handlers::source_list(name, id, &payload, mode)),
        ToolHandler::SwitchNetwork => handlers::switch_network(&payload),
        ToolHandler::ApproveErc20 => handlers::approve_erc20(name, id, &payload, ctx),
        ToolHandler::Swap => handlers::swap(name, id, &payload, ctx),
    }
}

/// The dispatcher boundary: parse the raw `content`, expand it, and contain
/// every failure as a log line plus an empty expansion.
pub fn dispatch_content(
    table: &ToolTable,
    name: &str,
    id: &str,
    content: &Value,
    ctx: &DispatchContext,
    mode: Mode,
) -> Expansion {
    let Some(handler) = table.get(name) else {
        tracing::trace!(tool = name, "ignoring tool outside the dispatch table");
        return Expansion::default();
    };
    let result = payload::parse_content(content)
        .map_err(DispatchError::from)
        .and_then(|payload| expand(table, name, id, payload, ctx, mode));
    match result {
        Ok(expansion) => expansion,
        Err(e) => {
            tracing::warn!(tool = name, id, %handler, error = %e, ?mode, "dropping tool result");
            Expansion::default()
        }
    }
}
