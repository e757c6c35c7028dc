//! Core data model.

pub mod entry;
pub mod event;
pub mod thread;

pub use entry::*;
pub use event::*;
pub use thread::*;
