//! spotter-api - Swamp Spotter HTTP service
//!
//! Accepts plant sightings from field volunteers, suggests a species from a
//! photo, and lets admins moderate submissions.
//!
//! Default port: 5780

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use spotter_api::services::{Classifier, GeminiClient};
use spotter_api::AppState;
use spotter_common::config::{
    resolve_classifier_api_key, RootFolderInitializer, RootFolderResolver, TomlConfig,
    DEFAULT_PORT,
};
use spotter_common::SpeciesRegistry;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "spotter-api")]
#[command(about = "Swamp Spotter invasive plant sighting service")]
#[command(version)]
struct Args {
    /// HTTP port (overrides config file)
    #[arg(short, long, env = "SPOTTER_PORT")]
    port: Option<u16>,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Config file (default: platform config directory)
    #[arg(short, long, env = "SPOTTER_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address (overrides config file)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read first so its log level can seed the filter
    let (config, config_source) = TomlConfig::load_or_default(args.config.as_deref());

    let default_filter = format!(
        "spotter_api={level},spotter_common={level},tower_http={level}",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting spotter-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log();

    let root_folder = RootFolderResolver::new(args.root_folder, &config).resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db = spotter_common::db::init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let registry = Arc::new(SpeciesRegistry::builtin());
    info!("Species registry: {} entries", registry.len());

    let classifier: Option<Arc<dyn Classifier>> =
        match resolve_classifier_api_key(&config.classifier) {
            Some(key) => {
                let client = GeminiClient::new(&config.classifier, key)
                    .context("Failed to build classifier client")?;
                info!(model = %config.classifier.model, "Photo identification enabled");
                Some(Arc::new(client) as Arc<dyn Classifier>)
            }
            None => None,
        };

    let bounds = config.bounds();
    info!(
        "Service area: lat {}..{}, lng {}..{}",
        bounds.min_lat, bounds.max_lat, bounds.min_lng, bounds.max_lng
    );

    let state = AppState::new(db, registry, classifier, bounds);
    let app = spotter_api::build_router(state);

    let port = args.port.or(config.port).unwrap_or(DEFAULT_PORT);
    let bind = args
        .bind
        .or(config.bind_address)
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
