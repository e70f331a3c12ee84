use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use lc_core::ports::{BroadcastPublisherPort, BroadcastSubscriberPort, SystemClipboardPort};
use anyhow::Context;
use lc_core::{
    BroadcastMessage, ClipboardEntry, History, NodeId, NodeIdentity, NodeSettings, Peer, PeerSet,
    PeerUpdate, SubscriberState,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn, Instrument};

use super::event_bus::{
    NodeCommand, NodeCommandReceiver, NodeEvent, NodeEventReceiver, NodeEventSender,
};
use super::handle::PeerStatus;
use crate::deps::NodeDeps;
use crate::usecases::SubscriberTask;

struct SubscriberHandle {
    id: u64,
    cancel: CancellationToken,
    state: SubscriberState,
}

/// Sole owner of the history, the peer set and the subscriber table.
///
/// Every mutation happens inside [`NodeRuntime::run`], in the order events
/// arrive on the event channel.
pub struct NodeRuntime {
    identity: NodeIdentity,
    settings: NodeSettings,
    history: History,
    peers: PeerSet,
    subscribers: HashMap<IpAddr, SubscriberHandle>,
    next_subscriber_id: u64,
    clipboard: Arc<dyn SystemClipboardPort>,
    publisher: Arc<dyn BroadcastPublisherPort>,
    connector: Arc<dyn BroadcastSubscriberPort>,
    event_tx: NodeEventSender,
    event_rx: NodeEventReceiver,
    command_rx: NodeCommandReceiver,
    history_tx: watch::Sender<Vec<ClipboardEntry>>,
    shutdown: CancellationToken,
}

impl NodeRuntime {
    pub fn new(
        deps: &NodeDeps,
        event_tx: NodeEventSender,
        event_rx: NodeEventReceiver,
        command_rx: NodeCommandReceiver,
        history_tx: watch::Sender<Vec<ClipboardEntry>>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            identity: deps.identity.clone(),
            settings: deps.settings.clone(),
            history: History::with_capacity(deps.settings.history_capacity),
            peers: PeerSet::new(),
            subscribers: HashMap::new(),
            next_subscriber_id: 1,
            clipboard: deps.clipboard.clone(),
            publisher: deps.publisher.clone(),
            connector: deps.connector.clone(),
            event_tx,
            event_rx,
            command_rx,
            history_tx,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        info!(node_id = %self.identity.node_id, "Node runtime started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                Some(event) = self.event_rx.recv() => self.handle_event(event).await,
                Some(command) = self.command_rx.recv() => {
                    if !self.handle_command(command).await {
                        self.shutdown.cancel();
                        break;
                    }
                }
                else => break,
            }
        }

        for (_, handle) in self.subscribers.drain() {
            handle.cancel.cancel();
        }
        info!(node_id = %self.identity.node_id, "Node runtime stopped");
    }

    async fn handle_event(&mut self, event: NodeEvent) {
        match event {
            NodeEvent::LocalClipboardChanged { value } => {
                // The poller may report a value this runtime has since
                // overwritten; only what the clipboard still holds counts.
                match self.read_clipboard().await {
                    Ok(current) if current.as_deref() != Some(value.as_str()) => {
                        trace!("Dropping stale clipboard observation");
                        return;
                    }
                    Ok(_) => {}
                    Err(err) => debug!(error = %err, "Clipboard re-read failed"),
                }
                let origin = self.identity.node_id.clone();
                if self.append_and_publish(value, origin) {
                    debug!("Local clipboard change recorded");
                }
            }
            NodeEvent::BroadcastReceived { from, message } => {
                self.on_broadcast_received(from, message).await;
            }
            NodeEvent::PeerAdvertised(peer) => self.on_peer_advertised(peer),
            NodeEvent::PeerWithdrawn { service_name } => {
                let Some(peer) = self.peers.remove_by_service_name(&service_name) else {
                    trace!(service_name = %service_name, "Withdrawal for unknown peer");
                    return;
                };
                info!(peer = %peer.label(), address = %peer.address, "Peer withdrawn");
                if let Some(handle) = self.subscribers.remove(&peer.ip()) {
                    handle.cancel.cancel();
                }
            }
            NodeEvent::SubscriberStateChanged {
                address,
                subscriber_id,
                state,
            } => self.on_subscriber_state(address, subscriber_id, state),
        }
    }

    /// Returns `false` when the runtime should stop.
    async fn handle_command(&mut self, command: NodeCommand) -> bool {
        match command {
            NodeCommand::Copy { value, reply } => {
                let result = match self.write_clipboard(value.clone()).await {
                    Ok(()) => {
                        let origin = self.identity.node_id.clone();
                        Ok(self.append_and_publish(value, origin))
                    }
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
            }
            NodeCommand::Paste { reply } => {
                let _ = reply.send(self.read_clipboard().await);
            }
            NodeCommand::History { reply } => {
                let _ = reply.send(self.history.snapshot());
            }
            NodeCommand::Peers { reply } => {
                let _ = reply.send(self.peer_statuses());
            }
            NodeCommand::Shutdown => {
                info!("Node runtime shutting down");
                return false;
            }
        }
        true
    }

    async fn on_broadcast_received(&mut self, from: SocketAddr, message: BroadcastMessage) {
        if self.identity.is_local_origin(&message.origin) {
            trace!(from = %from, "Ignoring echo of a local entry");
            return;
        }

        let BroadcastMessage { value, origin } = message;
        let accepted = self.append_and_publish(value.clone(), origin.clone());
        if !accepted {
            trace!(from = %from, origin = %origin, "Received value equals latest entry");
            return;
        }

        debug!(from = %from, origin = %origin, bytes = value.len(), "Accepted remote entry");
        if self.settings.write_received_to_clipboard {
            if let Err(err) = self.write_clipboard(value).await {
                error!(error = %err, "Failed to write received value to clipboard");
            }
        }
    }

    fn on_peer_advertised(&mut self, peer: Peer) {
        let address = peer.address;
        let label = peer.label().to_string();
        match self.peers.upsert(peer) {
            PeerUpdate::Added => {
                info!(peer = %label, address = %address, "Peer discovered");
                self.start_subscriber(address);
            }
            PeerUpdate::Renamed {
                previous,
                port_changed,
            } => {
                // A restarted peer advertises a fresh name before its old
                // record expires. The subscriber keeps running unless the
                // publisher moved to another port.
                info!(peer = %label, address = %address, previous = %previous, "Peer re-advertised");
                if port_changed || !self.subscribers.contains_key(&address.ip()) {
                    if let Some(handle) = self.subscribers.remove(&address.ip()) {
                        handle.cancel.cancel();
                    }
                    self.start_subscriber(address);
                }
            }
            PeerUpdate::Unchanged => {
                trace!(peer = %label, address = %address, "Peer already known");
            }
        }
    }

    fn on_subscriber_state(&mut self, address: IpAddr, subscriber_id: u64, state: SubscriberState) {
        let Some(handle) = self.subscribers.get_mut(&address) else {
            trace!(address = %address, subscriber_id, "State change from retired subscriber");
            return;
        };
        if handle.id != subscriber_id {
            trace!(address = %address, subscriber_id, "State change from stale subscriber");
            return;
        }

        debug!(address = %address, subscriber_id, state = ?state, "Subscriber state changed");
        handle.state = state;

        match state {
            SubscriberState::Failed => {
                self.subscribers.remove(&address);
                if let Some(peer) = self.peers.remove(&address) {
                    warn!(peer = %peer.label(), address = %address, "Giving up on peer");
                }
            }
            SubscriberState::Cancelled => {
                self.subscribers.remove(&address);
            }
            _ => {}
        }
    }

    fn start_subscriber(&mut self, address: SocketAddr) {
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;

        let cancel = self.shutdown.child_token();
        let task = SubscriberTask::new(
            id,
            address,
            self.identity.node_id.clone(),
            self.connector.clone(),
            self.settings.reconnect,
            self.event_tx.clone(),
            cancel.clone(),
        );
        let span = tracing::info_span!("subscriber", peer = %address, subscriber_id = id);
        tokio::spawn(task.run().instrument(span));

        self.subscribers.insert(
            address.ip(),
            SubscriberHandle {
                id,
                cancel,
                state: SubscriberState::Connecting,
            },
        );
    }

    async fn read_clipboard(&self) -> anyhow::Result<Option<String>> {
        let clipboard = self.clipboard.clone();
        tokio::task::spawn_blocking(move || clipboard.read_text())
            .await
            .context("clipboard read task failed")?
    }

    async fn write_clipboard(&self, value: String) -> anyhow::Result<()> {
        let clipboard = self.clipboard.clone();
        tokio::task::spawn_blocking(move || clipboard.write_text(&value))
            .await
            .context("clipboard write task failed")?
    }

    /// Append to history; on success publish the entry and refresh watchers.
    fn append_and_publish(&mut self, value: String, origin: NodeId) -> bool {
        if !self.history.append(value, origin) {
            return false;
        }

        if let Some(entry) = self.history.latest() {
            let delivered = self.publisher.publish(&BroadcastMessage::from(entry));
            debug!(origin = %entry.origin, delivered, "Published clipboard entry");
        }
        self.history_tx.send_replace(self.history.snapshot());
        true
    }

    fn peer_statuses(&self) -> Vec<PeerStatus> {
        let mut statuses: Vec<PeerStatus> = self
            .peers
            .iter()
            .map(|peer| PeerStatus {
                peer: peer.clone(),
                subscriber: self.subscribers.get(&peer.ip()).map(|handle| handle.state),
            })
            .collect();
        statuses.sort_by(|a, b| a.peer.service_name.as_str().cmp(b.peer.service_name.as_str()));
        statuses
    }
}
