//! Node assembly: advertise, then start discovery, the clipboard poller and
//! the runtime that owns all shared state.

use anyhow::{Context, Result};
use lc_core::ServiceRecord;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::deps::NodeDeps;
use crate::runtime::event_bus::{command_channel, event_channel};
use crate::runtime::{NodeHandle, NodeRuntime};
use crate::usecases::{AdvertiseNode, ClipboardPoller, DiscoverPeers};

/// A started node. Dropping it does not stop the tasks; call
/// [`RunningNode::shutdown`] or cancel through the handle.
pub struct RunningNode {
    handle: NodeHandle,
    advertisement: ServiceRecord,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl RunningNode {
    pub fn handle(&self) -> NodeHandle {
        self.handle.clone()
    }

    /// The service record that won registration.
    pub fn advertisement(&self) -> &ServiceRecord {
        &self.advertisement
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Wait until the node is shut down from anywhere, then join its tasks.
    pub async fn wait(self) {
        self.shutdown.cancelled().await;
        self.join().await;
    }

    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.join().await;
    }

    async fn join(self) {
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "Node task ended abnormally");
            }
        }
        info!(service = %self.advertisement.fullname(), "Node stopped");
    }
}

/// Start every task of a node.
///
/// Fails when the node cannot be advertised or discovery cannot start; no
/// task is left running in that case.
pub async fn start_node(deps: NodeDeps) -> Result<RunningNode> {
    let span = info_span!("node.start", node_id = %deps.identity.node_id);

    async move {
        let shutdown = CancellationToken::new();
        let (event_tx, event_rx) = event_channel();
        let (command_tx, command_rx) = command_channel();
        let (history_tx, history_rx) = watch::channel(Vec::new());

        let advertisement = AdvertiseNode::new(deps.registry.clone())
            .execute(
                &deps.identity,
                &deps.settings.service_type,
                deps.settings.broadcast_port,
            )
            .await
            .context("failed to advertise node")?;

        let discovery = DiscoverPeers::new(
            deps.discovery.clone(),
            deps.identity.clone(),
            advertisement.name.clone(),
            deps.settings.service_type.clone(),
            event_tx.clone(),
            shutdown.child_token(),
        )
        .spawn()?;

        let poller = ClipboardPoller::new(
            deps.clipboard.clone(),
            deps.settings.poll_interval,
            event_tx.clone(),
            shutdown.child_token(),
        );
        let poller = tokio::spawn(poller.run().instrument(info_span!("clipboard_poller")));

        let runtime = NodeRuntime::new(
            &deps,
            event_tx,
            event_rx,
            command_rx,
            history_tx,
            shutdown.clone(),
        );
        let runtime = tokio::spawn(
            runtime
                .run()
                .instrument(info_span!("node_runtime", node_id = %deps.identity.node_id)),
        );

        info!(
            service = %advertisement.fullname(),
            address = %deps.identity.address,
            port = advertisement.port,
            "Node started"
        );

        Ok(RunningNode {
            handle: NodeHandle::new(deps.identity.node_id.clone(), command_tx, history_rx),
            advertisement,
            shutdown,
            tasks: vec![runtime, discovery, poller],
        })
    }
    .instrument(span)
    .await
}
