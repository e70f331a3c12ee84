// NodeEvent describes facts observed by a task; NodeCommand is a request
// from the front end. Both are consumed only by NodeRuntime.

use std::net::{IpAddr, SocketAddr};

use anyhow::Result;
use lc_core::{BroadcastMessage, ClipboardEntry, Peer, SubscriberState};
use tokio::sync::{mpsc, oneshot};

use super::handle::PeerStatus;

pub const EVENT_CHANNEL_CAPACITY: usize = 256;
pub const COMMAND_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug)]
pub enum NodeEvent {
    /// The local clipboard now holds `value`.
    LocalClipboardChanged { value: String },
    /// A peer's publisher delivered a well-formed message.
    BroadcastReceived {
        from: SocketAddr,
        message: BroadcastMessage,
    },
    /// A peer advertisement resolved to an address other than ours.
    PeerAdvertised(Peer),
    /// A peer advertisement went away.
    PeerWithdrawn { service_name: String },
    SubscriberStateChanged {
        address: IpAddr,
        subscriber_id: u64,
        state: SubscriberState,
    },
}

#[derive(Debug)]
pub enum NodeCommand {
    Copy {
        value: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    Paste {
        reply: oneshot::Sender<Result<Option<String>>>,
    },
    History {
        reply: oneshot::Sender<Vec<ClipboardEntry>>,
    },
    Peers {
        reply: oneshot::Sender<Vec<PeerStatus>>,
    },
    Shutdown,
}

pub type NodeEventSender = mpsc::Sender<NodeEvent>;
pub type NodeEventReceiver = mpsc::Receiver<NodeEvent>;

pub type NodeCommandSender = mpsc::Sender<NodeCommand>;
pub type NodeCommandReceiver = mpsc::Receiver<NodeCommand>;

pub fn event_channel() -> (NodeEventSender, NodeEventReceiver) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}

pub fn command_channel() -> (NodeCommandSender, NodeCommandReceiver) {
    mpsc::channel(COMMAND_CHANNEL_CAPACITY)
}
