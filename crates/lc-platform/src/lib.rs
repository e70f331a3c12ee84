//! # lc-platform
//!
//! Platform adapters for LanClip.
//!
//! Implements the `lc-core` ports against the operating system and the LAN:
//! mDNS service registration and browsing, the TCP broadcast publisher and
//! subscriber, the system clipboard, and host identity resolution.

pub mod adapters;
pub mod identity;
pub mod net_utils;

pub use identity::resolve_node_identity;
