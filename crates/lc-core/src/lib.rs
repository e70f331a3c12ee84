//! # lc-core
//!
//! Core domain models and ports for LanClip.
//!
//! This crate contains pure domain logic without any infrastructure dependencies:
//! node identity, the shared clipboard history, the peer set, the broadcast
//! wire format and the port traits implemented by `lc-platform`.

pub mod config;
pub mod history;
pub mod identity;
pub mod ids;
pub mod network;
pub mod ports;
pub mod protocol;
pub mod settings;

// Re-export commonly used types at the crate root
pub use config::AppConfig;
pub use history::{ClipboardEntry, History};
pub use identity::{NodeIdentity, ResolutionError};
pub use ids::NodeId;
pub use network::{
    DiscoveryEvent, Peer, PeerSet, PeerUpdate, ResolvedService, ServiceName, ServiceRecord,
    SubscriberState,
};
pub use protocol::{BroadcastMessage, WireError};
pub use settings::NodeSettings;
