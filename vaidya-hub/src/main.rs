//! vaidya-hub - PharmaVaidya service
//!
//! Serves the plant catalog, remedy board, progress tracking and the
//! pronunciation game over HTTP + SSE.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vaidya_common::config::{RootFolderInitializer, RootFolderResolver};
use vaidya_common::events::EventBus;
use vaidya_hub::config::{resolve_genai_api_key, HubConfig};
use vaidya_hub::services::genai::GenAiClient;
use vaidya_hub::services::pronunciation::{SESSION_IDLE_TTL, SESSION_SWEEP_INTERVAL};
use vaidya_hub::services::Collaborators;
use vaidya_hub::{build_router, AppState};

/// Command-line arguments for vaidya-hub
#[derive(Parser, Debug)]
#[command(name = "vaidya-hub")]
#[command(about = "PharmaVaidya medicinal plant knowledge service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the TOML config)
    #[arg(short, long, env = "VAIDYA_HUB_PORT")]
    port: Option<u16>,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = RootFolderResolver::new("vaidya-hub").with_cli_arg(args.root_folder);
    let toml_config = resolver.load_toml();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vaidya_hub={0},vaidya_common={0},tower_http=info", toml_config.logging.level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting vaidya-hub v{}", env!("CARGO_PKG_VERSION"));

    let initializer = RootFolderInitializer::new(resolver.resolve_with(&toml_config));
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db = vaidya_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let mut config = HubConfig::from_toml(&toml_config)?
        .load_game_timing(&db)
        .await?;
    if let Some(port) = args.port {
        config.port = port;
    }
    info!(
        port = config.port,
        remedy_backend = ?config.remedy_backend,
        verification = ?config.verification,
        matcher = ?config.matcher,
        "Configuration resolved"
    );

    let collaborators = match resolve_genai_api_key(&db, &toml_config).await? {
        Some(key) => match GenAiClient::new(
            key,
            &config.genai_base_url,
            &config.genai_model,
            &config.speech_model,
        ) {
            Ok(client) => Collaborators::from_genai(Arc::new(client)),
            Err(e) => {
                error!("Failed to create GenAI client: {}", e);
                Collaborators::unconfigured()
            }
        },
        None => Collaborators::unconfigured(),
    };

    let event_bus = EventBus::new(100);
    let port = config.port;
    let state = AppState::new(db, event_bus, config, collaborators)
        .with_config_path(resolver.config_file_path());
    let games = state.games.clone();
    let sweeper_token = CancellationToken::new();
    let sweeper = games.spawn_sweeper(
        SESSION_IDLE_TTL,
        SESSION_SWEEP_INTERVAL,
        sweeper_token.clone(),
    );
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper_token.cancel();
    if let Err(e) = sweeper.await {
        warn!("Session sweeper ended abnormally: {}", e);
    }
    games.teardown_all().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
