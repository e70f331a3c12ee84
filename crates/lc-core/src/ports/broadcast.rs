//! Broadcast ports - the publish/subscribe fabric between nodes.

use std::net::SocketAddr;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::protocol::BroadcastMessage;

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("failed to bind publisher on {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// The single outbound broadcast endpoint of this node.
pub trait BroadcastPublisherPort: Send + Sync {
    /// Fan `message` out to every subscriber connected right now.
    ///
    /// Never waits for subscribers. Returns how many subscribers the message
    /// was handed to; `0` means it was dropped.
    fn publish(&self, message: &BroadcastMessage) -> usize;

    fn subscriber_count(&self) -> usize;
}

/// Opens subscriptions to remote publishers.
#[async_trait]
pub trait BroadcastSubscriberPort: Send + Sync {
    /// Connect to the publisher at `address`.
    ///
    /// The receiver yields one raw payload per frame and closes when the
    /// connection ends. Dropping the receiver closes the connection.
    async fn connect(&self, address: SocketAddr) -> Result<mpsc::Receiver<Vec<u8>>>;
}
