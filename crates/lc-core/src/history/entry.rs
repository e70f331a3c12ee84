use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// One clipboard value together with the node that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub value: String,
    pub origin: NodeId,
    /// When this node accepted the entry. Display only.
    pub received_at: DateTime<Utc>,
}

impl ClipboardEntry {
    pub fn new(value: impl Into<String>, origin: NodeId) -> Self {
        Self {
            value: value.into(),
            origin,
            received_at: Utc::now(),
        }
    }
}

impl PartialEq for ClipboardEntry {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.origin == other.origin
    }
}

impl Eq for ClipboardEntry {}
