use anyhow::Result;
use tokio::sync::mpsc;

use crate::network::DiscoveryEvent;

/// Discovery port providing a live feed of advertisements.
pub trait DiscoveryPort: Send + Sync {
    /// Start watching for instances of `service_type`.
    ///
    /// The receiver yields resolved and removed services until the backend
    /// shuts down.
    fn browse(&self, service_type: &str) -> Result<mpsc::Receiver<DiscoveryEvent>>;
}
