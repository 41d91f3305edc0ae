//! requestline-server - Listener song requests for PlayIt Live
//!
//! Serves the request API and runs the background processor that places
//! requested tracks into REQUEST slots of the playout log.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use requestline_server::catalog::TrackCatalog;
use requestline_server::config::{Args, Config};
use requestline_server::matcher::SlotMatcher;
use requestline_server::playout::{PlayItLiveClient, PlayoutLog, TrackLibrary};
use requestline_server::policy::AllowAll;
use requestline_server::processor::RequestProcessor;
use requestline_server::queue::RequestQueue;
use requestline_server::scheduler::Scheduler;
use requestline_server::{build_router, AdminAuth, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "requestline_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting requestline-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = match Config::load(Args::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!("Error: {}", e);
            std::process::exit(1);
        }
    };
    config.log_summary();

    let client = Arc::new(
        PlayItLiveClient::new(
            &config.playit_live_base_url,
            &config.playit_live_api_key,
            config.upstream_timeout,
        )
        .context("Failed to create PlayIt Live client")?,
    );
    let playout_log: Arc<dyn PlayoutLog> = client.clone();
    let library: Arc<dyn TrackLibrary> = client;

    let catalog = Arc::new(TrackCatalog::new(
        library,
        config.requestable_track_group.clone(),
    ));
    catalog.refresh_logged().await;

    let queue = RequestQueue::in_memory(config.max_message_length);

    let processor = Arc::new(RequestProcessor::new(
        queue.clone(),
        SlotMatcher::new(playout_log.clone(), catalog.clone()),
        playout_log,
        Arc::new(AllowAll),
    ));

    let scheduler = Scheduler::start(
        processor,
        catalog.clone(),
        config.process_interval,
        config.catalog_refresh_interval,
    );

    let state = AppState::new(
        catalog,
        queue,
        AdminAuth {
            password: config.admin_password.clone(),
            token_secret: config.token_secret.clone(),
        },
    )
    .with_static_dir(config.static_dir.clone());
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Server is running on port {}", config.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    scheduler.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
