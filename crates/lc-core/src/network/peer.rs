use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::service::ServiceName;
use crate::ids::NodeId;

/// Another node seen on the LAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub service_name: ServiceName,
    pub node_id: Option<NodeId>,
    /// Publisher endpoint of the peer.
    pub address: SocketAddr,
    pub discovered_at: DateTime<Utc>,
}

impl Peer {
    pub fn new(service_name: ServiceName, node_id: Option<NodeId>, address: SocketAddr) -> Self {
        Self {
            service_name,
            node_id,
            address,
            discovered_at: Utc::now(),
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.address.ip()
    }

    /// Best human-readable label: node id when advertised, service name otherwise.
    pub fn label(&self) -> &str {
        self.node_id
            .as_ref()
            .map(NodeId::as_str)
            .unwrap_or_else(|| self.service_name.as_str())
    }
}

/// Outcome of [`PeerSet::upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerUpdate {
    Added,
    /// The address was already known under `previous`.
    Renamed {
        previous: ServiceName,
        port_changed: bool,
    },
    Unchanged,
}

/// Live peers keyed by IP address. One address maps to at most one peer.
#[derive(Debug, Default, Clone)]
pub struct PeerSet {
    peers: HashMap<IpAddr, Peer>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an advertisement. One address maps to one peer.
    ///
    /// A new name for a known address replaces the stored name, so a later
    /// withdrawal of the old name no longer matches the live peer.
    pub fn upsert(&mut self, peer: Peer) -> PeerUpdate {
        match self.peers.entry(peer.ip()) {
            Entry::Vacant(slot) => {
                slot.insert(peer);
                PeerUpdate::Added
            }
            Entry::Occupied(mut slot) => {
                let known = slot.get_mut();
                if known.service_name == peer.service_name && known.address == peer.address {
                    return PeerUpdate::Unchanged;
                }
                let previous = std::mem::replace(&mut known.service_name, peer.service_name);
                let port_changed = known.address != peer.address;
                known.node_id = peer.node_id;
                known.address = peer.address;
                PeerUpdate::Renamed {
                    previous,
                    port_changed,
                }
            }
        }
    }

    pub fn remove(&mut self, address: &IpAddr) -> Option<Peer> {
        self.peers.remove(address)
    }

    /// Remove the peer that was added under `service_name`.
    ///
    /// A withdrawal for a name that no longer owns its address (the address
    /// was re-advertised under a new name) leaves the current peer in place.
    pub fn remove_by_service_name(&mut self, service_name: &str) -> Option<Peer> {
        let address = self
            .peers
            .iter()
            .find(|(_, peer)| peer.service_name.as_str() == service_name)
            .map(|(address, _)| *address)?;
        self.peers.remove(&address)
    }

    pub fn contains(&self, address: &IpAddr) -> bool {
        self.peers.contains_key(address)
    }

    pub fn get(&self, address: &IpAddr) -> Option<&Peer> {
        self.peers.get(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
