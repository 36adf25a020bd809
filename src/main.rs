use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use statemark::config::{Config, StorageBackend};
use statemark::store::KvStore;
use statemark::AppState;

#[derive(Parser, Debug)]
#[command(name = "statemark")]
#[command(author, version, about = "A self-hosted 'states I've visited' travel map service", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "statemark.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Statemark v{}", env!("CARGO_PKG_VERSION"));

    // Ensure data directory exists
    std::fs::create_dir_all(&config.server.data_dir)?;

    let router = match config.storage.backend {
        StorageBackend::File => {
            let store = KvStore::open(config.server.data_dir.join("statemark.json"))?;
            let state = Arc::new(AppState::new(config.clone(), store));

            // Warm the boundary cache in the background; a failure only
            // means there is no choropleth layer until a later request
            // retries the fetch.
            tokio::spawn({
                let state = state.clone();
                async move {
                    if let Err(e) = state.boundaries.get().await {
                        tracing::warn!(error = %e, "Boundary data prefetch failed");
                    }
                }
            });

            statemark::api::create_router(state)
        }
        StorageBackend::Sqlite => {
            let pool = statemark::db::init(&config.server.data_dir).await?;
            statemark::db::api_router(pool)
        }
    };

    // Serve the front-end with an index fallback
    let index_file = config.server.static_dir.join("index.html");
    let serve_static =
        ServeDir::new(&config.server.static_dir).not_found_service(ServeFile::new(&index_file));

    let app = router.fallback_service(serve_static);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Public URL: {}", config.server.public_url());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
