use lc_core::config::AppConfig;
use tracing::{error, info};

use super::wiring::wire_node;

/// Start the node and keep it running until Ctrl-C or an internal shutdown.
pub async fn run_app(config: AppConfig) -> anyhow::Result<()> {
    let deps = wire_node(&config).await?;
    let node = lc_app::start_node(deps).await?;
    let shutdown = node.shutdown_token();

    info!(service = %node.advertisement().fullname(), "LanClip running, press Ctrl-C to stop");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Ctrl-C received, shutting down"),
                Err(err) => error!(error = %err, "Failed to listen for Ctrl-C, shutting down"),
            }
            node.shutdown().await;
        }
        _ = shutdown.cancelled() => {
            node.wait().await;
        }
    }

    Ok(())
}
