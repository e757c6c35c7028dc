//! Thread rehydration: rebuild the live-equivalent conversation from a
//! persisted flat history.
//!
//! Pure: no network, no wallet effects. Tool messages go through the same
//! [`dispatch_content`] as the live stream, in [`Mode::Replay`].

use crate::classify::{extract_text, tool_result_id};
use crate::dispatch::{dispatch_content, DispatchContext, Mode, ToolTable};
use crate::types::{ConversationEntry, RawMessage};

/// Rehydrate with the built-in tool table.
pub fn rehydrate(messages: &[RawMessage]) -> Vec<ConversationEntry> {
    rehydrate_with(ToolTable::builtin(), messages)
}

pub fn rehydrate_with(tools: &ToolTable, messages: &[RawMessage]) -> Vec<ConversationEntry> {
    let ctx = DispatchContext::replay();
    let mut entries = Vec::with_capacity(messages.len());
    for (position, message) in messages.iter().enumerate() {
        match message {
            RawMessage::Human { content, .. } => {
                entries.push(ConversationEntry::user(extract_text(content)));
            }
            RawMessage::Ai { id, content } => {
                let text = extract_text(content);
                // Tool-calling turns carry no text; the live path never shows them either.
                if text.is_empty() {
                    continue;
                }
                let id = id.clone().unwrap_or_else(|| format!("history-{position}"));
                entries.push(ConversationEntry::assistant(id, text));
            }
            RawMessage::Tool {
                id,
                tool_call_id,
                name,
                content,
            } => {
                let id = tool_result_id(tool_call_id.as_deref(), id.as_deref()).unwrap_or_default();
                let expansion = dispatch_content(tools, name, id, content, &ctx, Mode::Replay);
                entries.extend(expansion.entries);
            }
        }
    }
    entries
}
