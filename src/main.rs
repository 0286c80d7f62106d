use anyhow::{Context, Result};
use lingua_dispatch::{build_service, config::Config, server};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingua_dispatch=info".parse()?),
        )
        .init();

    info!("Starting multilingual dispatch service");

    // Load configuration from environment
    let config = Config::from_env()?;
    info!("Translation provider: {:?}", config.provider);
    if let Some(path) = &config.ledger_path {
        info!("Delivery ledger journal: {}", path.display());
    }

    let service = build_service(&config).context("Failed to initialize dispatch service")?;
    let app = server::router(service, config.api_key.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
