//! Streaming runs against the remote agent execution service.

pub mod http;

pub use http::HttpRunSource;

use async_trait::async_trait;
use bon::Builder;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::RunEvent;
use crate::wallet::ChainId;

/// Per-call settings forwarded to the agent runtime. Owned by the caller.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunContext {
    #[builder(into)]
    pub model: Option<String>,
    pub chain_id: Option<ChainId>,
    #[builder(into)]
    pub wallet_address: Option<String>,
    #[builder(into)]
    pub user_id: Option<String>,
}

/// One user turn to run on a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunInput {
    pub thread_id: String,
    pub message: String,
    #[serde(default)]
    pub context: RunContext,
}

impl RunInput {
    pub fn new(thread_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            message: message.into(),
            context: RunContext::default(),
        }
    }

    pub fn with_context(mut self, context: RunContext) -> Self {
        self.context = context;
        self
    }
}

/// Ordered run events. Ends without a terminal event on completion, on
/// cancellation and after a transport error alike.
pub type RunEventStream = BoxStream<'static, Result<RunEvent>>;

/// Source of run event streams.
#[async_trait]
pub trait RunSource: Send + Sync {
    /// Open one streaming run. The stream ends quietly once `cancel` fires.
    async fn open_run(&self, input: &RunInput, cancel: CancellationToken) -> Result<RunEventStream>;

    /// Resolve a shareable link for a finished run.
    async fn share_run(&self, run_id: &str) -> Result<String>;
}
