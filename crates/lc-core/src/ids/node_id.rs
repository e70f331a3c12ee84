use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const FALLBACK_NODE_ID: &str = "node";

/// Human-readable identifier of a node, used as the origin label of every
/// clipboard entry it produces.
///
/// A `NodeId` never contains whitespace: the wire format splits a message on
/// its last space, so an origin label with a space in it could not be
/// recovered by the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Build a node id from a raw label, replacing every whitespace run with
    /// `-` and trimming separators at both ends.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let mut out = String::with_capacity(raw.as_ref().len());
        let mut pending_sep = false;
        for ch in raw.as_ref().trim().chars() {
            if ch.is_whitespace() {
                pending_sep = true;
                continue;
            }
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch);
        }

        if out.is_empty() {
            out.push_str(FALLBACK_NODE_ID);
        }
        Self(out)
    }

    /// Derive the node id from a machine hostname.
    ///
    /// The domain part is dropped (`laptop.lan` → `laptop`) so that the same
    /// machine keeps the same id regardless of which DHCP search domain it
    /// currently sits in.
    pub fn from_hostname(hostname: &str) -> Self {
        let host = hostname.trim();
        let short = host.split('.').next().unwrap_or(host);
        Self::new(short)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_keeps_simple_labels() {
        assert_eq!(NodeId::new("alice-laptop").as_str(), "alice-laptop");
    }

    #[test]
    fn test_node_id_replaces_whitespace_runs() {
        assert_eq!(NodeId::new("  Alice's   Mac\tmini ").as_str(), "Alice's-Mac-mini");
    }

    #[test]
    fn test_node_id_never_empty() {
        assert_eq!(NodeId::new("").as_str(), "node");
        assert_eq!(NodeId::new(" \t ").as_str(), "node");
    }

    #[test]
    fn test_from_hostname_drops_domain() {
        assert_eq!(NodeId::from_hostname("desk.local").as_str(), "desk");
        assert_eq!(NodeId::from_hostname("build-box").as_str(), "build-box");
    }

    #[test]
    fn test_deserialized_node_id_is_normalized() {
        #[derive(Deserialize)]
        struct Entry {
            origin: NodeId,
        }

        let entry: Entry = toml::from_str("origin = \"Mac  mini \"").unwrap();
        assert_eq!(entry.origin.as_str(), "Mac-mini");
    }

    #[test]
    fn test_node_id_compares_with_str() {
        let id = NodeId::from("bob");
        assert!(id == "bob");
        assert_eq!(format!("{id}"), "bob");
    }
}
