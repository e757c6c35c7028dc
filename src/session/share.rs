//! Run share links.
//!
//! Resolving a link is a detached, best-effort task: it never blocks the
//! consumer loop, and a failed lookup is logged at debug level and dropped.
//! The user sees no error for it. Successful links travel back over a
//! channel and are appended by the session owner.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::run_source::RunSource;
use crate::types::ConversationEntry;

/// A resolved link, tagged with the conversation generation it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedLink {
    pub generation: u64,
    pub entry: ConversationEntry,
}

/// Spawn the lookup. Dropping the handle does not cancel it.
pub fn spawn_share_link(
    source: Arc<dyn RunSource>,
    run_id: String,
    generation: u64,
    tx: mpsc::UnboundedSender<SharedLink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match source.share_run(&run_id).await {
            Ok(url) => {
                let link = SharedLink {
                    generation,
                    entry: ConversationEntry::ShareLink { run_id, url },
                };
                // Receiver gone means the session was dropped.
                let _ = tx.send(link);
            }
            Err(e) => {
                tracing::debug!(run_id = %run_id, error = %e, "share link unavailable");
            }
        }
    })
}
