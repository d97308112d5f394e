//! Logstravaganza host entry point.

mod app;
mod config;
mod plugin;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting Logstravaganza"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run())?;

    tracing::info!("host shut down cleanly");
    Ok(())
}
