//! Use cases run by a node.
//!
//! [AdvertiseNode]    one-shot at startup
//! [DiscoverPeers]    forwards discovery facts to the runtime
//! [SubscriberTask]   one per peer, feeds received values to the runtime
//! [ClipboardPoller]  turns OS clipboard changes into local entries

pub mod advertise;
pub mod discover_peers;
pub mod poll_clipboard;
pub mod subscribe_peer;

pub use advertise::AdvertiseNode;
pub use discover_peers::DiscoverPeers;
pub use poll_clipboard::ClipboardPoller;
pub use subscribe_peer::SubscriberTask;
