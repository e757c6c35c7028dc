//! Run event envelopes as emitted by the remote agent runtime.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of a run event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
pub enum RunEventKind {
    #[strum(serialize = "on_chain_start")]
    #[serde(rename = "on_chain_start")]
    NodeStart,
    #[strum(serialize = "on_chain_end")]
    #[serde(rename = "on_chain_end")]
    NodeEnd,
    #[strum(serialize = "on_chat_model_stream")]
    #[serde(rename = "on_chat_model_stream")]
    TokenDelta,
    #[strum(serialize = "on_tool_end")]
    #[serde(rename = "on_tool_end")]
    ToolResult,
}

/// Raw envelope exactly as it arrives on the wire.
///
/// Only the fields read by the processor are modelled; everything else in
/// `data` stays opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEnvelope {
    pub event: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EnvelopeMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub langgraph_node: Option<String>,
}

/// One event of a run, consumed once in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub kind: RunEventKind,
    /// Graph node for node and token events; tool name for tool results.
    pub node_name: String,
    pub run_id: String,
    /// The envelope's `data` object.
    pub payload: serde_json::Value,
}

impl RunEvent {
    pub fn new(
        kind: RunEventKind,
        node_name: impl Into<String>,
        run_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            node_name: node_name.into(),
            run_id: run_id.into(),
            payload,
        }
    }

    /// Convert a wire envelope. Returns `None` for event kinds the processor
    /// does not consume.
    pub fn from_envelope(envelope: RunEnvelope) -> Option<Self> {
        let kind: RunEventKind = match envelope.event.parse() {
            Ok(kind) => kind,
            Err(_) => {
                tracing::trace!(event = %envelope.event, "skipping unconsumed event kind");
                return None;
            }
        };
        // Token events are named after the model; the graph node lives in metadata.
        let node_name = match (kind, envelope.metadata) {
            (RunEventKind::TokenDelta, Some(EnvelopeMetadata { langgraph_node: Some(node) })) => node,
            _ => envelope.name,
        };
        Some(Self {
            kind,
            node_name,
            run_id: envelope.run_id,
            payload: envelope.data,
        })
    }

    /// Parse a JSON-encoded envelope (one SSE `data:` frame).
    pub fn from_json(data: &str) -> Result<Option<Self>, serde_json::Error> {
        let envelope: RunEnvelope = serde_json::from_str(data)?;
        Ok(Self::from_envelope(envelope))
    }
}
