//! Page store engine
//!
//! This crate puts the lower layers together behind one facade:
//! - PageStore: init, record loads and flushes, cursor cache
//! - WorkBuffers: the two page-sized buffers a session owns
//!
//! The engine is the only component that knows about:
//! - Session lifecycle (uninitialized → ready)
//! - Which buffer is the caller's view and which is scratch
//! - Argument validation against the session's layout

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffers;
pub mod store;

pub use buffers::WorkBuffers;
pub use store::PageStore;
