//! Event classification: decide which handler consumes a run event.
//!
//! The backend graph has many internal nodes. Only the allowlisted ones are
//! visible to the user; everything else is dropped here on purpose.

use serde_json::Value;

use crate::types::{RunEvent, RunEventKind};

static NULL: Value = Value::Null;

/// Nodes whose model tokens are user-visible assistant text.
pub const TEXT_NODES: &[&str] = &["agent", "respond", "summarize", "chitchat"];

/// End event of this node closes every fan-out phase.
pub const BARRIER_NODE: &str = "reduce";

/// A fan-out phase: parallel sub-steps joined later by [`BARRIER_NODE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Phase {
    pub start_node: &'static str,
    pub end_node: &'static str,
    pub label: &'static str,
}

pub const FETCH_LINKS: Phase = Phase {
    start_node: "fetch_link",
    end_node: "fetch_link",
    label: "Fetching links",
};

pub const EXTRACT_CONTENT: Phase = Phase {
    start_node: "extract_content",
    end_node: "extract_content",
    label: "Extracting content",
};

/// Known fan-out phases, in the order they run.
pub const PHASES: &[Phase] = &[FETCH_LINKS, EXTRACT_CONTENT];

/// Where an event goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Text { message_id: String, fragment: String },
    TextNodeEnd,
    PhaseStart(Phase),
    PhaseEnd(Phase),
    Barrier,
    Tool { name: String, id: String, content: Value },
}

pub fn is_text_node(name: &str) -> bool {
    TEXT_NODES.contains(&name)
}

fn phase_started_by(name: &str) -> Option<Phase> {
    PHASES.iter().copied().find(|p| p.start_node == name)
}

fn phase_ended_by(name: &str) -> Option<Phase> {
    PHASES.iter().copied().find(|p| p.end_node == name)
}

/// Route one event. An empty result means the event is ignored.
pub fn classify(event: &RunEvent) -> Vec<Route> {
    let name = event.node_name.as_str();
    match event.kind {
        RunEventKind::TokenDelta if is_text_node(name) => {
            let chunk = event.payload.get("chunk").unwrap_or(&NULL);
            let fragment = extract_text(chunk.get("content").unwrap_or(&NULL));
            if fragment.is_empty() {
                return Vec::new();
            }
            let message_id = chunk
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or(event.run_id.as_str())
                .to_string();
            vec![Route::Text {
                message_id,
                fragment,
            }]
        }
        RunEventKind::NodeStart => phase_started_by(name)
            .map(Route::PhaseStart)
            .into_iter()
            .collect(),
        RunEventKind::NodeEnd => {
            let mut routes = Vec::new();
            if is_text_node(name) {
                routes.push(Route::TextNodeEnd);
            }
            if let Some(phase) = phase_ended_by(name) {
                routes.push(Route::PhaseEnd(phase));
            }
            if name == BARRIER_NODE {
                routes.push(Route::Barrier);
            }
            routes
        }
        RunEventKind::ToolResult => {
            let output = event.payload.get("output").unwrap_or(&NULL);
            let id = tool_result_id(
                output.get("tool_call_id").and_then(Value::as_str),
                output.get("id").and_then(Value::as_str),
            )
            .unwrap_or(event.run_id.as_str())
            .to_string();
            vec![Route::Tool {
                name: name.to_string(),
                id,
                content: output.get("content").cloned().unwrap_or(Value::Null),
            }]
        }
        RunEventKind::TokenDelta => Vec::new(),
    }
}

/// Entry id of a tool message: its tool call id, else its own message id.
/// Rehydration resolves stored tool messages through this too.
pub fn tool_result_id<'a>(tool_call_id: Option<&'a str>, message_id: Option<&'a str>) -> Option<&'a str> {
    tool_call_id
        .filter(|id| !id.is_empty())
        .or(message_id.filter(|id| !id.is_empty()))
}

/// Text of a message `content`, shared by the live token path and
/// rehydration so both render identically.
///
/// Arrays yield their first element's `text` field; strings pass through;
/// null yields nothing; any other value is stringified.
pub fn extract_text(content: &Value) -> String {
    match content {
        Value::Array(parts) => parts
            .first()
            .and_then(|part| part.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
