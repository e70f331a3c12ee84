//! mDNS (DNS-SD) service registration and browsing on top of `mdns-sd`.
//!
//! One [`MdnsBackend`] owns the daemon and a single browse of the node's
//! service type. The browse feeds both the collision check used by
//! registration and the discovery feed handed to the node.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use lc_core::network::NODE_ID_TXT_KEY;
use lc_core::ports::{DiscoveryPort, RegistrationError, ServiceRegistryPort};
use lc_core::{DiscoveryEvent, NodeId, ResolvedService, ServiceRecord};
use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

const FEED_CAPACITY: usize = 64;

pub struct MdnsBackend {
    daemon: ServiceDaemon,
    service_type: String,
    /// Full names currently advertised on the LAN by anyone.
    seen: Arc<Mutex<HashSet<String>>>,
    /// Full names registered by this backend.
    own: Mutex<HashSet<String>>,
    feed: Mutex<Option<mpsc::Receiver<DiscoveryEvent>>>,
}

impl MdnsBackend {
    /// Create the daemon and start browsing `service_type`.
    pub fn start(service_type: &str) -> Result<Arc<Self>> {
        let daemon =
            ServiceDaemon::new().map_err(|e| anyhow!("failed to start mDNS daemon: {}", e))?;
        let events = daemon
            .browse(service_type)
            .map_err(|e| anyhow!("failed to browse {}: {}", service_type, e))?;

        let seen = Arc::new(Mutex::new(HashSet::new()));
        let (feed_tx, feed_rx) = mpsc::channel(FEED_CAPACITY);

        let browse_seen = seen.clone();
        let browse_type = service_type.to_string();
        std::thread::Builder::new()
            .name("mdns-browse".to_string())
            .spawn(move || {
                while let Ok(event) = events.recv() {
                    let Some(event) = translate(&browse_type, event) else {
                        continue;
                    };
                    record_seen(&browse_seen, &browse_type, &event);
                    if feed_tx.blocking_send(event).is_err() {
                        // Nobody consumes the feed; keep tracking names.
                        trace!("Discovery feed dropped");
                    }
                }
                debug!("mDNS browse ended");
            })?;

        info!(service_type = %service_type, "mDNS daemon started");
        Ok(Arc::new(Self {
            daemon,
            service_type: service_type.to_string(),
            seen,
            own: Mutex::new(HashSet::new()),
            feed: Mutex::new(Some(feed_rx)),
        }))
    }

    fn name_taken(&self, fullname: &str) -> Result<bool, RegistrationError> {
        let own = self
            .own
            .lock()
            .map_err(|_| RegistrationError::Backend("registry lock poisoned".into()))?;
        let seen = self
            .seen
            .lock()
            .map_err(|_| RegistrationError::Backend("registry lock poisoned".into()))?;
        Ok(name_in_use(&own, &seen, fullname))
    }
}

impl ServiceRegistryPort for MdnsBackend {
    fn register(&self, record: &ServiceRecord) -> Result<(), RegistrationError> {
        let fullname = record.fullname();
        if self.name_taken(&fullname)? {
            return Err(RegistrationError::NameInUse(fullname));
        }

        let host_name = format!("{}.local.", record.node_id);
        let properties = [(NODE_ID_TXT_KEY, record.node_id.as_str())];
        let info = ServiceInfo::new(
            &record.service_type,
            record.name.as_str(),
            &host_name,
            IpAddr::V4(record.address),
            record.port,
            &properties[..],
        )
        .map_err(|e| RegistrationError::Backend(e.to_string()))?;

        self.daemon
            .register(info)
            .map_err(|e| RegistrationError::Backend(e.to_string()))?;

        if let Ok(mut own) = self.own.lock() {
            own.insert(fullname.clone());
        }
        debug!(service = %fullname, "Registered mDNS service");
        Ok(())
    }

    fn unregister(&self, record: &ServiceRecord) -> Result<(), RegistrationError> {
        let fullname = record.fullname();
        let owned = self
            .own
            .lock()
            .map(|mut own| own.remove(&fullname))
            .unwrap_or(false);
        if !owned {
            return Ok(());
        }

        self.daemon
            .unregister(&fullname)
            .map(|_| ())
            .map_err(|e| RegistrationError::Backend(e.to_string()))
    }
}

impl DiscoveryPort for MdnsBackend {
    fn browse(&self, service_type: &str) -> Result<mpsc::Receiver<DiscoveryEvent>> {
        if service_type != self.service_type {
            bail!(
                "mDNS backend browses {}, not {}",
                self.service_type,
                service_type
            );
        }
        self.feed
            .lock()
            .map_err(|_| anyhow!("discovery feed lock poisoned"))?
            .take()
            .ok_or_else(|| anyhow!("discovery feed already taken"))
    }
}

impl Drop for MdnsBackend {
    fn drop(&mut self) {
        if let Err(err) = self.daemon.shutdown() {
            warn!(error = %err, "Failed to shut down mDNS daemon");
        }
    }
}

fn translate(service_type: &str, event: ServiceEvent) -> Option<DiscoveryEvent> {
    match event {
        ServiceEvent::ServiceResolved(info) => {
            let name = instance_name(info.get_fullname(), service_type)?;
            let node_id = info.get_property_val_str(NODE_ID_TXT_KEY).map(NodeId::new);
            Some(DiscoveryEvent::ServiceResolved(ResolvedService {
                name,
                node_id,
                addresses: info.get_addresses().iter().copied().collect(),
                port: info.get_port(),
            }))
        }
        ServiceEvent::ServiceRemoved(_, fullname) => {
            let name = instance_name(&fullname, service_type)?;
            Some(DiscoveryEvent::ServiceRemoved { name })
        }
        _ => None,
    }
}

/// A name is in use while this backend holds it or the LAN still answers
/// for it. `mdns-sd` reports no conflicts of its own.
fn name_in_use(own: &HashSet<String>, seen: &HashSet<String>, fullname: &str) -> bool {
    own.contains(fullname) || seen.contains(fullname)
}

fn record_seen(seen: &Mutex<HashSet<String>>, service_type: &str, event: &DiscoveryEvent) {
    let Ok(mut seen) = seen.lock() else {
        return;
    };
    match event {
        DiscoveryEvent::ServiceResolved(service) => {
            seen.insert(format!("{}.{}", service.name, service_type));
        }
        DiscoveryEvent::ServiceRemoved { name } => {
            seen.remove(&format!("{}.{}", name, service_type));
        }
    }
}

/// `desk-1a2b._lanclip._tcp.local.` -> `desk-1a2b`
fn instance_name(fullname: &str, service_type: &str) -> Option<String> {
    fullname
        .strip_suffix(service_type)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPE: &str = "_lanclip._tcp.local.";

    #[test]
    fn test_instance_name_strips_service_type() {
        assert_eq!(
            instance_name("desk-1a2b._lanclip._tcp.local.", TYPE).as_deref(),
            Some("desk-1a2b")
        );
        assert_eq!(instance_name("desk-1a2b._other._tcp.local.", TYPE), None);
        assert_eq!(instance_name("._lanclip._tcp.local.", TYPE), None);
    }

    #[test]
    fn test_seen_names_follow_resolve_and_remove() {
        let seen = Mutex::new(HashSet::new());
        let resolved = DiscoveryEvent::ServiceResolved(ResolvedService {
            name: "desk-1a2b".to_string(),
            node_id: None,
            addresses: vec![],
            port: 47500,
        });
        record_seen(&seen, TYPE, &resolved);
        assert!(seen
            .lock()
            .unwrap()
            .contains("desk-1a2b._lanclip._tcp.local."));

        record_seen(
            &seen,
            TYPE,
            &DiscoveryEvent::ServiceRemoved {
                name: "desk-1a2b".to_string(),
            },
        );
        assert!(seen.lock().unwrap().is_empty());
    }

    fn names(items: &[&str]) -> HashSet<String> {
        items.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_name_in_use_by_another_node() {
        let own = HashSet::new();
        let seen = names(&["desk-1a2b._lanclip._tcp.local."]);

        assert!(name_in_use(&own, &seen, "desk-1a2b._lanclip._tcp.local."));
        assert!(!name_in_use(&own, &seen, "desk-9f9f._lanclip._tcp.local."));
    }

    #[test]
    fn test_name_held_by_this_backend_until_unregistered() {
        let mut own = names(&["desk-1a2b._lanclip._tcp.local."]);
        let seen = HashSet::new();
        assert!(name_in_use(&own, &seen, "desk-1a2b._lanclip._tcp.local."));

        own.remove("desk-1a2b._lanclip._tcp.local.");
        assert!(!name_in_use(&own, &seen, "desk-1a2b._lanclip._tcp.local."));
    }

    #[test]
    fn test_unregistered_name_stays_taken_until_lan_forgets_it() {
        let own = HashSet::new();
        let seen = Mutex::new(names(&["desk-1a2b._lanclip._tcp.local."]));
        assert!(name_in_use(
            &own,
            &seen.lock().unwrap(),
            "desk-1a2b._lanclip._tcp.local."
        ));

        record_seen(
            &seen,
            TYPE,
            &DiscoveryEvent::ServiceRemoved {
                name: "desk-1a2b".to_string(),
            },
        );
        assert!(!name_in_use(
            &own,
            &seen.lock().unwrap(),
            "desk-1a2b._lanclip._tcp.local."
        ));
    }

    #[test]
    fn test_removed_event_translates_to_instance_name() {
        let event = ServiceEvent::ServiceRemoved(
            TYPE.to_string(),
            "bravo-99._lanclip._tcp.local.".to_string(),
        );
        assert_eq!(
            translate(TYPE, event),
            Some(DiscoveryEvent::ServiceRemoved {
                name: "bravo-99".to_string()
            })
        );
    }
}
