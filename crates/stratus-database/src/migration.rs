//! Schema migration runner for the metadata store.

use sqlx::PgPool;
use tracing::info;

use stratus_core::error::{AppError, ErrorKind};

/// Apply any migrations not yet recorded in the target database.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, format!("Migration run failed: {e}"), e)
        })?;

    info!("Metadata schema is up to date");
    Ok(())
}
