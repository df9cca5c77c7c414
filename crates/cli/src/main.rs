use clap::Parser;
use eyre::WrapErr;
use prewarm_cache::PrecacheService;
use prewarm_cli::{create_router, Args};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();

    prewarm_utils::tracing::init().map_err(|e| eyre::eyre!("failed to initialize tracing: {e}"))?;

    let config = args.service_config();
    config.validate()?;

    info!(
        mount = %config.mount.display(),
        cache = %config.cache_dir.display(),
        chunk_size = config.registry.warmer.chunk_size,
        threads = config.registry.warmer.threads,
        "starting prewarm"
    );

    let service = Arc::new(PrecacheService::new(config));
    let app = create_router(service);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .wrap_err_with(|| format!("failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server failed")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
