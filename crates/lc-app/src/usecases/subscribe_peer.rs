//! One subscriber per peer: connect to its publisher, feed received values to
//! the runtime, reconnect with backoff.

use std::net::SocketAddr;
use std::sync::Arc;

use lc_core::ports::BroadcastSubscriberPort;
use lc_core::settings::ReconnectPolicy;
use lc_core::{BroadcastMessage, NodeId, SubscriberState};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::runtime::event_bus::{NodeEvent, NodeEventSender};

enum StreamEnd {
    Closed,
    Cancelled,
    RuntimeGone,
}

pub struct SubscriberTask {
    id: u64,
    address: SocketAddr,
    local_origin: NodeId,
    connector: Arc<dyn BroadcastSubscriberPort>,
    policy: ReconnectPolicy,
    events: NodeEventSender,
    cancel: CancellationToken,
}

impl SubscriberTask {
    pub fn new(
        id: u64,
        address: SocketAddr,
        local_origin: NodeId,
        connector: Arc<dyn BroadcastSubscriberPort>,
        policy: ReconnectPolicy,
        events: NodeEventSender,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            address,
            local_origin,
            connector,
            policy,
            events,
            cancel,
        }
    }

    /// Drive the subscriber until it is cancelled or gives up.
    ///
    /// Returns the terminal state, which is also reported to the runtime.
    pub async fn run(self) -> SubscriberState {
        let mut failures: u32 = 0;

        let terminal = loop {
            if !self.report(SubscriberState::Connecting).await {
                break SubscriberState::Cancelled;
            }

            let connected = tokio::select! {
                _ = self.cancel.cancelled() => break SubscriberState::Cancelled,
                result = self.connector.connect(self.address) => result,
            };

            match connected {
                Ok(frames) => {
                    failures = 0;
                    info!("Subscribed to peer publisher");
                    if !self.report(SubscriberState::Streaming).await {
                        break SubscriberState::Cancelled;
                    }
                    match self.stream(frames).await {
                        StreamEnd::Closed => info!("Peer stream ended"),
                        StreamEnd::Cancelled | StreamEnd::RuntimeGone => {
                            break SubscriberState::Cancelled
                        }
                    }
                }
                Err(err) => {
                    failures = failures.saturating_add(1);
                    warn!(error = %err, failures, "Failed to connect to peer");
                    if self.policy.is_exhausted(failures) {
                        break SubscriberState::Failed;
                    }
                }
            }

            let attempt = failures.max(1);
            let delay = self.policy.delay_for(attempt);
            if !self.report(SubscriberState::Backoff { attempt }).await {
                break SubscriberState::Cancelled;
            }
            debug!(attempt, delay_ms = delay.as_millis() as u64, "Waiting before reconnect");

            tokio::select! {
                _ = self.cancel.cancelled() => break SubscriberState::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        };

        self.report(terminal).await;
        info!(state = ?terminal, "Subscriber stopped");
        terminal
    }

    async fn stream(&self, mut frames: mpsc::Receiver<Vec<u8>>) -> StreamEnd {
        loop {
            let frame = tokio::select! {
                _ = self.cancel.cancelled() => return StreamEnd::Cancelled,
                frame = frames.recv() => frame,
            };
            let Some(frame) = frame else {
                return StreamEnd::Closed;
            };

            let message = match BroadcastMessage::decode_bytes(&frame) {
                Ok(message) => message,
                Err(err) => {
                    warn!(error = %err, bytes = frame.len(), "Dropping malformed frame");
                    continue;
                }
            };
            if message.origin == self.local_origin {
                trace!("Dropping echo of a local entry");
                continue;
            }

            let event = NodeEvent::BroadcastReceived {
                from: self.address,
                message,
            };
            if self.events.send(event).await.is_err() {
                return StreamEnd::RuntimeGone;
            }
        }
    }

    /// Returns `false` once the runtime is gone.
    async fn report(&self, state: SubscriberState) -> bool {
        self.events
            .send(NodeEvent::SubscriberStateChanged {
                address: self.address.ip(),
                subscriber_id: self.id,
                state,
            })
            .await
            .is_ok()
    }
}
