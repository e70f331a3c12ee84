//! Announce this node on the LAN under a collision-free service name.
//! 在局域网中以不冲突的服务名宣告本节点。

use std::sync::Arc;

use lc_core::network::random_suffix;
use lc_core::ports::{RegistrationError, ServiceRegistryPort};
use lc_core::{NodeIdentity, ServiceName, ServiceRecord};
use tracing::{info, info_span, warn, Instrument};

type SuffixSource = Box<dyn FnMut() -> String + Send>;

/// Use case registering the node's service record.
///
/// ## Behavior / 行为
/// - Name collision: release the partial registration, draw a new suffix,
///   retry. There is no retry limit.
/// - Any other registration error is returned to the caller.
pub struct AdvertiseNode {
    registry: Arc<dyn ServiceRegistryPort>,
    next_suffix: SuffixSource,
}

impl AdvertiseNode {
    pub fn new(registry: Arc<dyn ServiceRegistryPort>) -> Self {
        Self {
            registry,
            next_suffix: Box::new(random_suffix),
        }
    }

    /// Replace the random suffix generator.
    pub fn with_suffix_source(mut self, source: impl FnMut() -> String + Send + 'static) -> Self {
        self.next_suffix = Box::new(source);
        self
    }

    /// Register the node and return the record that won.
    pub async fn execute(
        &mut self,
        identity: &NodeIdentity,
        service_type: &str,
        port: u16,
    ) -> Result<ServiceRecord, RegistrationError> {
        let span = info_span!(
            "usecase.advertise_node.execute",
            node_id = %identity.node_id,
            port
        );

        async {
            let mut attempt: u32 = 1;
            loop {
                let record = ServiceRecord {
                    name: ServiceName::compose(&identity.node_id, &(self.next_suffix)()),
                    service_type: service_type.to_string(),
                    node_id: identity.node_id.clone(),
                    address: identity.address,
                    port,
                };

                match self.registry.register(&record) {
                    Ok(()) => {
                        info!(service = %record.fullname(), attempt, "Node advertised");
                        return Ok(record);
                    }
                    Err(RegistrationError::NameInUse(name)) => {
                        warn!(name = %name, attempt, "Service name already taken, retrying");
                        if let Err(err) = self.registry.unregister(&record) {
                            warn!(error = %err, "Failed to release partial registration");
                        }
                        attempt = attempt.saturating_add(1);
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        .instrument(span)
        .await
    }
}
