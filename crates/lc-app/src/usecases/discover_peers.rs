//! Forward discovery facts to the node runtime, minus our own advertisement.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use lc_core::ports::DiscoveryPort;
use lc_core::{DiscoveryEvent, NodeIdentity, Peer, ServiceName};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace, warn, Instrument};

use crate::runtime::event_bus::{NodeEvent, NodeEventSender};

pub struct DiscoverPeers {
    discovery: Arc<dyn DiscoveryPort>,
    identity: NodeIdentity,
    own_name: ServiceName,
    service_type: String,
    events: NodeEventSender,
    cancel: CancellationToken,
}

impl DiscoverPeers {
    pub fn new(
        discovery: Arc<dyn DiscoveryPort>,
        identity: NodeIdentity,
        own_name: ServiceName,
        service_type: impl Into<String>,
        events: NodeEventSender,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            discovery,
            identity,
            own_name,
            service_type: service_type.into(),
            events,
            cancel,
        }
    }

    /// Start browsing and spawn the forwarding task.
    ///
    /// Only the browse call itself can fail; once running, the task ends when
    /// the backend closes its feed, the runtime goes away or `cancel` fires.
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let mut feed = self
            .discovery
            .browse(&self.service_type)
            .with_context(|| format!("failed to browse for {}", self.service_type))?;
        info!(service_type = %self.service_type, "Browsing for peers");

        let span = info_span!("usecase.discover_peers.run", service_type = %self.service_type);
        let handle = tokio::spawn(
            async move {
                loop {
                    let event = tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        event = feed.recv() => match event {
                            Some(event) => event,
                            None => {
                                warn!("Discovery feed closed");
                                break;
                            }
                        },
                    };

                    let Some(event) = self.classify(event) else {
                        continue;
                    };
                    if self.events.send(event).await.is_err() {
                        debug!("Node runtime gone, stopping discovery");
                        break;
                    }
                }
            }
            .instrument(span),
        );
        Ok(handle)
    }

    /// Turn a discovery fact into a runtime event, dropping self-discovery.
    fn classify(&self, event: DiscoveryEvent) -> Option<NodeEvent> {
        match event {
            DiscoveryEvent::ServiceResolved(service) => {
                if service.name == self.own_name.as_str() {
                    trace!(name = %service.name, "Ignoring own advertisement");
                    return None;
                }
                let Some(ip) = service.preferred_address() else {
                    debug!(name = %service.name, "Resolved service has no address");
                    return None;
                };
                if self.identity.is_local_address(&ip) {
                    trace!(name = %service.name, address = %ip, "Ignoring local address");
                    return None;
                }

                debug!(name = %service.name, address = %ip, port = service.port, "Service resolved");
                Some(NodeEvent::PeerAdvertised(Peer::new(
                    ServiceName::from_advertised(service.name),
                    service.node_id,
                    SocketAddr::new(ip, service.port),
                )))
            }
            DiscoveryEvent::ServiceRemoved { name } => {
                if name == self.own_name.as_str() {
                    return None;
                }
                debug!(name = %name, "Service removed");
                Some(NodeEvent::PeerWithdrawn { service_name: name })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::event_bus::event_channel;
    use lc_core::{NodeId, ResolvedService};
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct FeedDiscovery {
        feed: std::sync::Mutex<Option<mpsc::Receiver<DiscoveryEvent>>>,
    }

    impl DiscoveryPort for FeedDiscovery {
        fn browse(&self, _service_type: &str) -> Result<mpsc::Receiver<DiscoveryEvent>> {
            self.feed
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| anyhow::anyhow!("already browsing"))
        }
    }

    fn resolved(name: &str, ip: [u8; 4]) -> DiscoveryEvent {
        DiscoveryEvent::ServiceResolved(ResolvedService {
            name: name.to_string(),
            node_id: Some(NodeId::new(name.split('-').next().unwrap())),
            addresses: vec![IpAddr::V4(Ipv4Addr::from(ip))],
            port: 47500,
        })
    }

    fn discoverer(
        feed: mpsc::Receiver<DiscoveryEvent>,
        events: NodeEventSender,
        cancel: CancellationToken,
    ) -> DiscoverPeers {
        DiscoverPeers::new(
            Arc::new(FeedDiscovery {
                feed: std::sync::Mutex::new(Some(feed)),
            }),
            NodeIdentity::new(NodeId::new("alpha"), Ipv4Addr::new(10, 0, 0, 1)),
            ServiceName::from_advertised("alpha-111"),
            "_lanclip._tcp.local.",
            events,
            cancel,
        )
    }

    #[tokio::test]
    async fn test_forwards_peers_and_skips_self() {
        let (feed_tx, feed_rx) = mpsc::channel(8);
        let (events_tx, mut events_rx) = event_channel();
        let cancel = CancellationToken::new();
        let handle = discoverer(feed_rx, events_tx, cancel.clone())
            .spawn()
            .unwrap();

        feed_tx.send(resolved("alpha-111", [10, 0, 0, 7])).await.unwrap();
        feed_tx.send(resolved("alpha-222", [10, 0, 0, 1])).await.unwrap();
        feed_tx.send(resolved("bravo-333", [10, 0, 0, 2])).await.unwrap();
        feed_tx
            .send(DiscoveryEvent::ServiceRemoved {
                name: "bravo-333".to_string(),
            })
            .await
            .unwrap();

        match events_rx.recv().await {
            Some(NodeEvent::PeerAdvertised(peer)) => {
                assert_eq!(peer.service_name.as_str(), "bravo-333");
                assert_eq!(peer.address, "10.0.0.2:47500".parse().unwrap());
                assert_eq!(peer.label(), "bravo");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match events_rx.recv().await {
            Some(NodeEvent::PeerWithdrawn { service_name }) => {
                assert_eq!(service_name, "bravo-333")
            }
            other => panic!("unexpected event: {other:?}"),
        }

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("discoverer stops")
            .unwrap();
    }

    #[tokio::test]
    async fn test_browse_failure_is_reported() {
        let (_feed_tx, feed_rx) = mpsc::channel(1);
        let (events_tx, _events_rx) = event_channel();
        let discovery = Arc::new(FeedDiscovery {
            feed: std::sync::Mutex::new(Some(feed_rx)),
        });
        discovery.browse("_x._tcp.local.").unwrap();

        let result = DiscoverPeers::new(
            discovery,
            NodeIdentity::new(NodeId::new("alpha"), Ipv4Addr::new(10, 0, 0, 1)),
            ServiceName::from_advertised("alpha-111"),
            "_lanclip._tcp.local.",
            events_tx,
            CancellationToken::new(),
        )
        .spawn();

        assert!(result.is_err());
    }
}
