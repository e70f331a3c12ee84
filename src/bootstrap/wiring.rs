//! Wiring: turn configuration into concrete adapters and `NodeDeps`.
//! 装配：根据配置创建具体适配器并组装 NodeDeps。

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use lc_app::NodeDeps;
use lc_core::config::AppConfig;
use lc_core::NodeSettings;
use lc_platform::adapters::{MdnsBackend, SystemClipboard, TcpPublisher, TcpSubscriberConnector};
use lc_platform::resolve_node_identity;
use tracing::info;

/// Build every adapter a node needs.
///
/// Everything fatal at startup happens here: invalid settings, identity
/// resolution, the publisher bind, the mDNS daemon and the clipboard context.
pub async fn wire_node(config: &AppConfig) -> anyhow::Result<NodeDeps> {
    let settings = NodeSettings::from_config(config).context("invalid configuration")?;
    let identity = resolve_node_identity(settings.node_name.as_deref())
        .context("failed to resolve node identity")?;

    let bind = SocketAddr::new(settings.bind_address, settings.broadcast_port);
    let publisher = TcpPublisher::bind(bind, settings.max_frame_bytes)
        .await
        .context("another instance may already be running")?;

    let mdns = MdnsBackend::start(&settings.service_type)?;
    let clipboard = SystemClipboard::new().context("failed to open system clipboard")?;
    let connector = TcpSubscriberConnector::new(settings.max_frame_bytes);

    info!(
        node_id = %identity.node_id,
        address = %identity.address,
        publisher = %publisher.local_addr(),
        "Adapters ready"
    );

    Ok(NodeDeps {
        identity,
        settings,
        clipboard: Arc::new(clipboard),
        registry: mdns.clone(),
        discovery: mdns,
        publisher: Arc::new(publisher),
        connector: Arc::new(connector),
    })
}
