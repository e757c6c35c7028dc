//! Conversation entries: the sole externally visible state.

use serde::{Deserialize, Serialize};

/// A progress placeholder for a fan-out phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub id: String,
    pub label: String,
    /// 0..=100.
    pub percent: u8,
}

/// One entry of the ordered conversation.
///
/// Entries are value objects. An "update" replaces the entry at its index,
/// so a snapshot taken earlier never observes the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEntry {
    UserText {
        text: String,
    },
    AssistantText {
        id: String,
        text: String,
    },
    ToolResult {
        name: String,
        args: serde_json::Value,
        id: String,
    },
    Progress(ProgressEntry),
    ShareLink {
        run_id: String,
        url: String,
    },
}

impl ConversationEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::UserText { text: text.into() }
    }

    pub fn assistant(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::AssistantText {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn tool(name: impl Into<String>, args: serde_json::Value, id: impl Into<String>) -> Self {
        Self::ToolResult {
            name: name.into(),
            args,
            id: id.into(),
        }
    }

    pub fn progress(id: impl Into<String>, label: impl Into<String>, percent: u8) -> Self {
        Self::Progress(ProgressEntry {
            id: id.into(),
            label: label.into(),
            percent,
        })
    }

    /// Id of the entry, if it carries one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::AssistantText { id, .. } | Self::ToolResult { id, .. } => Some(id),
            Self::Progress(p) => Some(&p.id),
            Self::UserText { .. } | Self::ShareLink { .. } => None,
        }
    }

    pub fn as_progress(&self) -> Option<&ProgressEntry> {
        match self {
            Self::Progress(p) => Some(p),
            _ => None,
        }
    }
}
