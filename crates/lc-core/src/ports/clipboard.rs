//! Clipboard port - abstracts the operating system clipboard
//!
//! Only plain text is shared between nodes.

use anyhow::Result;

pub trait SystemClipboardPort: Send + Sync {
    /// Read the current clipboard text. `None` when the clipboard holds no text.
    fn read_text(&self) -> Result<Option<String>>;

    /// Replace the clipboard content with `text`.
    fn write_text(&self, text: &str) -> Result<()>;
}
