use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// DNS-SD service type advertised by every node.
pub const DEFAULT_SERVICE_TYPE: &str = "_lanclip._tcp.local.";

/// TXT property carrying the advertiser's node id.
pub const NODE_ID_TXT_KEY: &str = "node_id";

/// Longest instance label DNS allows.
const MAX_LABEL_BYTES: usize = 63;
const SUFFIX_LEN: usize = 12;

/// Advertised instance name: `<node_id>-<random suffix>`.
///
/// The suffix keeps two runs on the same host from claiming the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceName(String);

impl ServiceName {
    /// Combine a node id with a caller-supplied suffix.
    ///
    /// The node part is shortened (on a char boundary) so that the whole
    /// label fits in one DNS label.
    pub fn compose(node_id: &NodeId, suffix: &str) -> Self {
        let room = MAX_LABEL_BYTES.saturating_sub(suffix.len() + 1);
        let node = node_id.as_str();
        let mut end = node.len().min(room);
        while !node.is_char_boundary(end) {
            end -= 1;
        }
        Self(format!("{}-{}", &node[..end], suffix))
    }

    /// Combine a node id with a freshly generated random suffix.
    pub fn generate(node_id: &NodeId) -> Self {
        Self::compose(node_id, &random_suffix())
    }

    /// Wrap a name seen on the network.
    pub fn from_advertised(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ServiceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn random_suffix() -> String {
    let mut suffix = uuid::Uuid::new_v4().simple().to_string();
    suffix.truncate(SUFFIX_LEN);
    suffix
}

/// Everything needed to announce a node on the LAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: ServiceName,
    pub service_type: String,
    pub node_id: NodeId,
    pub address: Ipv4Addr,
    pub port: u16,
}

impl ServiceRecord {
    /// Fully qualified instance name, e.g. `desk-1a2b3c._lanclip._tcp.local.`.
    pub fn fullname(&self) -> String {
        format!("{}.{}", self.name, self.service_type)
    }
}
