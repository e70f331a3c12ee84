use lanclip_lib::bootstrap::{self, tracing::init_tracing_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing_subscriber()?;

    let config_path = bootstrap::resolve_config_path();
    let config = bootstrap::load_config_or_empty(config_path.as_deref())?;

    if let Err(err) = bootstrap::run_app(config).await {
        tracing::error!(error = %format!("{err:#}"), "LanClip failed");
        return Err(err);
    }
    Ok(())
}
