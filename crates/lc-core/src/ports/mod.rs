//! Ports implemented by platform adapters.
//!
//! Use cases in `lc-app` depend only on these traits, never on a concrete
//! network or clipboard backend.

pub mod broadcast;
pub mod clipboard;
pub mod discovery;
pub mod service_registry;

pub use broadcast::{BroadcastPublisherPort, BroadcastSubscriberPort, PublisherError};
pub use clipboard::SystemClipboardPort;
pub use discovery::DiscoveryPort;
pub use service_registry::{RegistrationError, ServiceRegistryPort};
