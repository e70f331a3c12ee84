use anyhow::{anyhow, Result};
use lc_core::{ClipboardEntry, NodeId, Peer, SubscriberState};
use serde::Serialize;
use tokio::sync::{oneshot, watch};

use super::event_bus::{NodeCommand, NodeCommandSender};

/// A peer together with the state of its subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct PeerStatus {
    pub peer: Peer,
    pub subscriber: Option<SubscriberState>,
}

/// Front-end facade over a running node.
///
/// Cheap to clone; every call is a message to the node runtime.
#[derive(Clone)]
pub struct NodeHandle {
    node_id: NodeId,
    commands: NodeCommandSender,
    history: watch::Receiver<Vec<ClipboardEntry>>,
}

impl NodeHandle {
    pub(crate) fn new(
        node_id: NodeId,
        commands: NodeCommandSender,
        history: watch::Receiver<Vec<ClipboardEntry>>,
    ) -> Self {
        Self {
            node_id,
            commands,
            history,
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Put `value` on the system clipboard and record it as a local entry.
    ///
    /// Returns `false` when the value equals the latest entry.
    pub async fn copy(&self, value: impl Into<String>) -> Result<bool> {
        let value = value.into();
        self.request(|reply| NodeCommand::Copy { value, reply })
            .await?
    }

    /// Read the system clipboard.
    pub async fn paste(&self) -> Result<Option<String>> {
        self.request(|reply| NodeCommand::Paste { reply }).await?
    }

    pub async fn history(&self) -> Result<Vec<ClipboardEntry>> {
        self.request(|reply| NodeCommand::History { reply }).await
    }

    /// Receiver updated after every accepted append, for display.
    pub fn watch_history(&self) -> watch::Receiver<Vec<ClipboardEntry>> {
        self.history.clone()
    }

    pub async fn peers(&self) -> Result<Vec<PeerStatus>> {
        self.request(|reply| NodeCommand::Peers { reply }).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.commands
            .send(NodeCommand::Shutdown)
            .await
            .map_err(|_| anyhow!("node runtime already stopped"))
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> NodeCommand,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| anyhow!("node runtime already stopped"))?;
        response
            .await
            .map_err(|_| anyhow!("node runtime dropped the request"))
    }
}
