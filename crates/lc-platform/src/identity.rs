//! Node identity resolution: hostname plus primary LAN address.

use lc_core::{NodeId, NodeIdentity, ResolutionError};
use tracing::info;

use crate::net_utils::primary_lan_ipv4;

/// Resolve this node's identity once at startup.
///
/// `node_name` overrides the hostname when set. Address resolution failure is
/// fatal for the caller.
pub fn resolve_node_identity(node_name: Option<&str>) -> Result<NodeIdentity, ResolutionError> {
    let node_id = match node_name {
        Some(name) => NodeId::new(name),
        None => NodeId::from_hostname(&gethostname::gethostname().to_string_lossy()),
    };
    let address = primary_lan_ipv4()?;

    info!(node_id = %node_id, address = %address, "Resolved node identity");
    Ok(NodeIdentity::new(node_id, address))
}
