use clap::Parser;
use miette::{IntoDiagnostic, Result};
use multiorder::application::engine::DispatchEngine;
use multiorder::config::ServerConfig;
use multiorder::domain::ports::RemoteClientRef;
use multiorder::domain::remote::RemoteResponse;
use multiorder::infrastructure::http::HttpRemoteClient;
use multiorder::infrastructure::in_memory::InMemoryRemote;
use multiorder::interfaces::http::{AppState, router};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "multiorder=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::parse();

    let client: RemoteClientRef = if config.dry_run {
        warn!("Dry run: submissions are logged and every account is approved");
        Arc::new(InMemoryRemote::logging(RemoteResponse::open()))
    } else {
        Arc::new(HttpRemoteClient::new(config.remote_timeout()).into_diagnostic()?)
    };

    let engine = DispatchEngine::new(client).with_deadline(config.dispatch_deadline());
    let app = router(AppState::new(engine.clone()), &config);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .into_diagnostic()?;
    info!(
        "Serving {} on {}",
        config.static_dir.display(),
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    engine.shutdown().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
