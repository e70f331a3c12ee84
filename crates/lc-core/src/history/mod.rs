//! Shared clipboard history.
//!
//! Every node keeps its own copy; copies converge through broadcast. The only
//! conflict rule is adjacent-duplicate suppression.

mod entry;
mod store;

pub use entry::ClipboardEntry;
pub use store::{History, DEFAULT_HISTORY_CAPACITY};
