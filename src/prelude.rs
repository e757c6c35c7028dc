//! Convenience re-exports for common use.

pub use crate::config::ClientConfig;
pub use crate::dispatch::{ToolHandler, ToolTable};
pub use crate::error::{ChatError, Result};
pub use crate::rehydrate::rehydrate;
pub use crate::run_source::{HttpRunSource, RunContext, RunInput, RunSource};
pub use crate::session::{ChatSession, RunOutcome, RunStatus};
pub use crate::types::{ConversationEntry, ProgressEntry, RawMessage, RunEvent, RunEventKind, Thread};
pub use crate::wallet::{ChainId, Notice, WalletBridge};
