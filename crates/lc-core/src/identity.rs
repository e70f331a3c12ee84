//! Node identity, resolved once at startup and immutable afterwards.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::NodeId;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no routable IPv4 address found on any network interface")]
    NoRoutableAddress,

    #[error("failed to enumerate network interfaces: {0}")]
    Interfaces(String),
}

/// Who this node is and where it can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub node_id: NodeId,
    pub address: Ipv4Addr,
}

impl NodeIdentity {
    pub fn new(node_id: NodeId, address: Ipv4Addr) -> Self {
        Self { node_id, address }
    }

    /// Whether an advertised address points back at this node.
    pub fn is_local_address(&self, address: &IpAddr) -> bool {
        match address {
            IpAddr::V4(v4) => *v4 == self.address,
            IpAddr::V6(v6) => v6.to_ipv4_mapped() == Some(self.address),
        }
    }

    /// Whether an origin label on the wire names this node.
    pub fn is_local_origin(&self, origin: &NodeId) -> bool {
        *origin == self.node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> NodeIdentity {
        NodeIdentity::new(NodeId::new("alpha"), Ipv4Addr::new(192, 168, 1, 10))
    }

    #[test]
    fn test_is_local_address_matches_v4() {
        let id = identity();
        assert!(id.is_local_address(&IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10))));
        assert!(!id.is_local_address(&IpAddr::V4(Ipv4Addr::new(192, 168, 1, 11))));
    }

    #[test]
    fn test_is_local_address_matches_v4_mapped_v6() {
        let id = identity();
        let mapped = Ipv4Addr::new(192, 168, 1, 10).to_ipv6_mapped();
        assert!(id.is_local_address(&IpAddr::V6(mapped)));
    }

    #[test]
    fn test_is_local_origin() {
        let id = identity();
        assert!(id.is_local_origin(&NodeId::new("alpha")));
        assert!(!id.is_local_origin(&NodeId::new("beta")));
    }
}
