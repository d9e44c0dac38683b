//! Stratus Server — personal cloud storage backend.
//!
//! Entry point that wires the crates together: configuration, logging,
//! database pool and migrations, the physical vault, and the services
//! on top of them.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use stratus_core::config::AppConfig;
use stratus_core::AppError;
use stratus_database::DatabasePool;
use stratus_service::{FileService, FolderService, SearchService, UserService};
use stratus_storage::LocalVault;

#[tokio::main]
async fn main() {
    let env = std::env::var("STRATUS_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Stratus v{}", env!("CARGO_PKG_VERSION"));

    tracing::info!("Connecting to database...");
    let db = DatabasePool::connect(&config.database).await?;
    db.health_check().await?;

    tracing::info!("Running database migrations...");
    stratus_database::migration::run_migrations(db.pool()).await?;
    tracing::info!("Database migrations complete");

    tracing::info!(root = %config.storage.root, "Opening vault...");
    let vault = LocalVault::new(config.storage.root.clone())
        .await
        .map_err(|e| AppError::storage(format!("Failed to open vault: {e}")))?;
    let vault = Arc::new(vault);

    let pool = db.pool().clone();
    let _users = UserService::new(pool.clone(), Arc::clone(&vault));
    let _folders = FolderService::new(pool.clone(), Arc::clone(&vault));
    let _files = FileService::new(pool.clone(), Arc::clone(&vault));
    let _search = SearchService::new(pool.clone());

    // TODO: mount the HTTP surface on top of these services once the API
    // crate lands; until then the binary only verifies the stack boots.
    tracing::info!("Stratus services ready");

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, closing...");

    db.close().await;
    tracing::info!("Stratus shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
