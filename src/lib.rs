//! cryptochat-core — agent run stream processor for a crypto chat assistant.
//!
//! Consumes the event stream of a remote multi-node agent run and turns it
//! into an ordered conversation: user turns, incrementally typed assistant
//! text, fan-out progress entries and structured tool results. Persisted
//! threads are rebuilt into the same conversation shape by [`rehydrate`],
//! which shares its tool dispatch with the live path.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use cryptochat_core::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> cryptochat_core::error::Result<()> {
//! let source = HttpRunSource::new(ClientConfig::from_env())?;
//! let mut session = ChatSession::new(Arc::new(source));
//! let outcome = session
//!     .run(RunInput::new("thread-1", "What's my ETH balance?"), CancellationToken::new())
//!     .await?;
//! println!("{:?}: {} entries", outcome.status, session.entries().len());
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod prelude;
pub mod progress;
pub mod rehydrate;
pub mod run_source;
pub mod session;
pub mod types;
pub mod wallet;

pub use rehydrate::rehydrate;
