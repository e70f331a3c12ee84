//! In-process LAN: registry, discovery and broadcast adapters sharing one
//! state, plus an in-memory clipboard.
//!
//! Used to run several nodes inside one test process. Every node gets its own
//! adapters from the same [`InMemoryLan`].

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lc_core::ports::{
    BroadcastPublisherPort, BroadcastSubscriberPort, DiscoveryPort, PublisherError,
    RegistrationError, ServiceRegistryPort, SystemClipboardPort,
};
use lc_core::{BroadcastMessage, DiscoveryEvent, ResolvedService, ServiceRecord};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const FEED_CAPACITY: usize = 64;
const FANOUT_CAPACITY: usize = 256;

#[derive(Default)]
struct LanState {
    next_owner: u64,
    registrations: HashMap<String, Registration>,
    browsers: Vec<Browser>,
    publishers: HashMap<SocketAddr, PublisherSlot>,
}

struct Registration {
    owner: u64,
    record: ServiceRecord,
}

struct Browser {
    service_type: String,
    tx: mpsc::Sender<DiscoveryEvent>,
}

struct PublisherSlot {
    frames: broadcast::Sender<Vec<u8>>,
    /// Cancelled to sever every open connection.
    session: CancellationToken,
    reachable: bool,
}

impl LanState {
    fn notify(&mut self, service_type: &str, event: DiscoveryEvent) {
        self.browsers.retain(|browser| !browser.tx.is_closed());
        for browser in self
            .browsers
            .iter()
            .filter(|browser| browser.service_type == service_type)
        {
            if let Err(err) = browser.tx.try_send(event.clone()) {
                warn!(error = %err, "In-memory discovery feed full");
            }
        }
    }
}

fn resolved(record: &ServiceRecord) -> DiscoveryEvent {
    DiscoveryEvent::ServiceResolved(ResolvedService {
        name: record.name.as_str().to_string(),
        node_id: Some(record.node_id.clone()),
        addresses: vec![IpAddr::V4(record.address)],
        port: record.port,
    })
}

/// A simulated LAN segment.
#[derive(Clone, Default)]
pub struct InMemoryLan {
    state: Arc<Mutex<LanState>>,
}

impl InMemoryLan {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A registry for one node. Each registry only releases its own names.
    pub fn registry(&self) -> InMemoryServiceRegistry {
        let owner = {
            let mut state = self.lock();
            state.next_owner += 1;
            state.next_owner
        };
        InMemoryServiceRegistry {
            lan: self.clone(),
            owner,
        }
    }

    pub fn discovery(&self) -> InMemoryDiscovery {
        InMemoryDiscovery { lan: self.clone() }
    }

    pub fn connector(&self) -> InMemoryConnector {
        InMemoryConnector { lan: self.clone() }
    }

    /// Claim `address` for a publisher. Fails when it is already claimed.
    pub fn bind_publisher(&self, address: SocketAddr) -> Result<InMemoryPublisher, PublisherError> {
        let mut state = self.lock();
        if state.publishers.contains_key(&address) {
            return Err(PublisherError::Bind {
                address,
                source: io::Error::from(io::ErrorKind::AddrInUse),
            });
        }

        let (frames, _) = broadcast::channel(FANOUT_CAPACITY);
        state.publishers.insert(
            address,
            PublisherSlot {
                frames: frames.clone(),
                session: CancellationToken::new(),
                reachable: true,
            },
        );
        Ok(InMemoryPublisher {
            lan: self.clone(),
            address,
            frames,
        })
    }

    /// Drop an advertisement as if its owner vanished from the network.
    pub fn withdraw(&self, fullname: &str) -> bool {
        let mut state = self.lock();
        let Some(registration) = state.registrations.remove(fullname) else {
            return false;
        };
        let record = registration.record;
        state.notify(
            &record.service_type,
            DiscoveryEvent::ServiceRemoved {
                name: record.name.as_str().to_string(),
            },
        );
        true
    }

    /// Cut every connection to the publisher at `address` and refuse new
    /// ones until [`InMemoryLan::restore`].
    pub fn sever(&self, address: SocketAddr) {
        let mut state = self.lock();
        if let Some(slot) = state.publishers.get_mut(&address) {
            slot.session.cancel();
            slot.session = CancellationToken::new();
            slot.reachable = false;
        }
    }

    pub fn restore(&self, address: SocketAddr) {
        if let Some(slot) = self.lock().publishers.get_mut(&address) {
            slot.reachable = true;
        }
    }

    /// Full names of every live registration, sorted.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().registrations.keys().cloned().collect();
        names.sort();
        names
    }
}

pub struct InMemoryServiceRegistry {
    lan: InMemoryLan,
    owner: u64,
}

impl ServiceRegistryPort for InMemoryServiceRegistry {
    fn register(&self, record: &ServiceRecord) -> Result<(), RegistrationError> {
        let fullname = record.fullname();
        let mut state = self.lan.lock();
        if state.registrations.contains_key(&fullname) {
            return Err(RegistrationError::NameInUse(fullname));
        }

        state.registrations.insert(
            fullname,
            Registration {
                owner: self.owner,
                record: record.clone(),
            },
        );
        state.notify(&record.service_type, resolved(record));
        Ok(())
    }

    fn unregister(&self, record: &ServiceRecord) -> Result<(), RegistrationError> {
        let fullname = record.fullname();
        let mut state = self.lan.lock();
        let owned = state
            .registrations
            .get(&fullname)
            .is_some_and(|registration| registration.owner == self.owner);
        if owned {
            state.registrations.remove(&fullname);
            state.notify(
                &record.service_type,
                DiscoveryEvent::ServiceRemoved {
                    name: record.name.as_str().to_string(),
                },
            );
        }
        Ok(())
    }
}

pub struct InMemoryDiscovery {
    lan: InMemoryLan,
}

impl DiscoveryPort for InMemoryDiscovery {
    fn browse(&self, service_type: &str) -> Result<mpsc::Receiver<DiscoveryEvent>> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let mut state = self.lan.lock();
        for registration in state.registrations.values() {
            if registration.record.service_type == service_type {
                tx.try_send(resolved(&registration.record))
                    .map_err(|e| anyhow!("discovery replay failed: {}", e))?;
            }
        }
        state.browsers.push(Browser {
            service_type: service_type.to_string(),
            tx,
        });
        Ok(rx)
    }
}

pub struct InMemoryPublisher {
    lan: InMemoryLan,
    address: SocketAddr,
    frames: broadcast::Sender<Vec<u8>>,
}

impl InMemoryPublisher {
    pub fn address(&self) -> SocketAddr {
        self.address
    }
}

impl BroadcastPublisherPort for InMemoryPublisher {
    fn publish(&self, message: &BroadcastMessage) -> usize {
        self.frames
            .send(message.encode().into_bytes())
            .unwrap_or(0)
    }

    fn subscriber_count(&self) -> usize {
        self.frames.receiver_count()
    }
}

impl Drop for InMemoryPublisher {
    fn drop(&mut self) {
        if let Some(slot) = self.lan.lock().publishers.remove(&self.address) {
            slot.session.cancel();
        }
    }
}

pub struct InMemoryConnector {
    lan: InMemoryLan,
}

#[async_trait]
impl BroadcastSubscriberPort for InMemoryConnector {
    async fn connect(&self, address: SocketAddr) -> Result<mpsc::Receiver<Vec<u8>>> {
        let (mut frames, session) = {
            let state = self.lan.lock();
            match state.publishers.get(&address) {
                Some(slot) if slot.reachable => (slot.frames.subscribe(), slot.session.clone()),
                _ => return Err(anyhow!("connection refused: {}", address)),
            }
        };

        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = session.cancelled() => break,
                    _ = tx.closed() => break,
                    frame = frames.recv() => match frame {
                        Ok(frame) => {
                            if tx.send(frame).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "In-memory subscriber lagging");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!(peer = %address, "In-memory connection closed");
        });
        Ok(rx)
    }
}

/// Clipboard held in memory.
#[derive(Default)]
pub struct InMemoryClipboard {
    text: Mutex<Option<String>>,
}

impl InMemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user copying `text`.
    pub fn set(&self, text: impl Into<String>) {
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.into());
    }

    pub fn current(&self) -> Option<String> {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SystemClipboardPort for InMemoryClipboard {
    fn read_text(&self) -> Result<Option<String>> {
        Ok(self.current())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        self.set(text);
        Ok(())
    }
}
