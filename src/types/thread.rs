//! Persisted thread history.

use serde::{Deserialize, Serialize};

/// A flat, already-completed message from a persisted thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawMessage {
    Human {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        content: serde_json::Value,
    },
    Ai {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        content: serde_json::Value,
    },
    Tool {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Id of the model's tool call this message answers. Entries are keyed
        /// by it when present, exactly as on the live stream.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
        #[serde(default)]
        name: String,
        content: serde_json::Value,
    },
}

/// A persisted conversation, owned outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    #[serde(default, alias = "messages")]
    pub stored_messages: Vec<RawMessage>,
}
