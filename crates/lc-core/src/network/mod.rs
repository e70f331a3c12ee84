//! Peer membership and service-discovery domain types.

mod events;
mod peer;
mod service;

pub use events::{DiscoveryEvent, ResolvedService, SubscriberState};
pub use peer::{Peer, PeerSet, PeerUpdate};
pub use service::{random_suffix, ServiceName, ServiceRecord, DEFAULT_SERVICE_TYPE, NODE_ID_TXT_KEY};
