use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// A service instance seen on the LAN, resolved to addresses and a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    /// Instance label without the service type, e.g. `desk-1a2b3c4d5e6f`.
    pub name: String,
    pub node_id: Option<NodeId>,
    pub addresses: Vec<IpAddr>,
    pub port: u16,
}

impl ResolvedService {
    /// Address a subscriber should dial: the first IPv4 address if any,
    /// otherwise whatever was advertised first.
    pub fn preferred_address(&self) -> Option<IpAddr> {
        self.addresses
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| self.addresses.first())
            .copied()
    }
}

/// Facts reported by the discovery backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    ServiceResolved(ResolvedService),
    ServiceRemoved { name: String },
}

/// Lifecycle of one subscriber task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriberState {
    Connecting,
    Streaming,
    Backoff { attempt: u32 },
    Failed,
    Cancelled,
}

impl SubscriberState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriberState::Failed | SubscriberState::Cancelled)
    }
}
