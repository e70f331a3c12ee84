use anyhow::{anyhow, Result};
use clipboard_rs::{Clipboard, ClipboardContext, ContentFormat};
use lc_core::ports::SystemClipboardPort;
use std::sync::{Arc, Mutex};
use tracing::{debug_span, trace};

/// OS clipboard implementation using clipboard-rs. Text only.
pub struct SystemClipboard {
    inner: Arc<Mutex<ClipboardContext>>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let context = ClipboardContext::new()
            .map_err(|e| anyhow!("Failed to create clipboard context: {}", e))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(context)),
        })
    }
}

impl SystemClipboardPort for SystemClipboard {
    fn read_text(&self) -> Result<Option<String>> {
        let span = debug_span!("platform.clipboard.read_text");
        span.in_scope(|| {
            let ctx = self
                .inner
                .lock()
                .map_err(|_| anyhow!("clipboard context lock poisoned"))?;
            if !ctx.has(ContentFormat::Text) {
                return Ok(None);
            }
            let text = ctx
                .get_text()
                .map_err(|e| anyhow!("Failed to read clipboard text: {}", e))?;
            trace!(bytes = text.len(), "Read clipboard text");
            Ok(Some(text))
        })
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let span = debug_span!("platform.clipboard.write_text", bytes = text.len());
        span.in_scope(|| {
            let ctx = self
                .inner
                .lock()
                .map_err(|_| anyhow!("clipboard context lock poisoned"))?;
            ctx.set_text(text.to_string())
                .map_err(|e| anyhow!("Failed to write clipboard text: {}", e))
        })
    }
}
