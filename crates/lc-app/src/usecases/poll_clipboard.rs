//! Clipboard poller: samples the OS clipboard on a fixed interval and reports
//! changes as local entries.

use std::sync::Arc;
use std::time::Duration;

use lc_core::ports::SystemClipboardPort;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::runtime::event_bus::{NodeEvent, NodeEventSender};

pub struct ClipboardPoller {
    clipboard: Arc<dyn SystemClipboardPort>,
    interval: Duration,
    events: NodeEventSender,
    cancel: CancellationToken,
}

impl ClipboardPoller {
    pub fn new(
        clipboard: Arc<dyn SystemClipboardPort>,
        interval: Duration,
        events: NodeEventSender,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            clipboard,
            interval,
            events,
            cancel,
        }
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_seen: Option<String> = None;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let clipboard = self.clipboard.clone();
            let current = match tokio::task::spawn_blocking(move || clipboard.read_text()).await {
                Ok(Ok(current)) => current,
                Ok(Err(err)) => {
                    debug!(error = %err, "Clipboard unreadable");
                    continue;
                }
                Err(err) => {
                    debug!(error = %err, "Clipboard read task failed");
                    continue;
                }
            };

            let Some(value) = observe(&mut last_seen, current) else {
                continue;
            };
            trace!(bytes = value.len(), "Clipboard changed");
            if self
                .events
                .send(NodeEvent::LocalClipboardChanged { value })
                .await
                .is_err()
            {
                break;
            }
        }
        debug!("Clipboard poller stopped");
    }
}

/// Record `current` and return it when it is a new, non-empty value.
fn observe(last_seen: &mut Option<String>, current: Option<String>) -> Option<String> {
    let current = current.filter(|text| !text.is_empty())?;
    if last_seen.as_deref() == Some(current.as_str()) {
        return None;
    }
    *last_seen = Some(current.clone());
    Some(current)
}
