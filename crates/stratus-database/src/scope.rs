//! Per-request transaction scope.
//!
//! Every inbound mutation runs its metadata writes inside one [`TxScope`]:
//! begin on entry, commit if the whole operation succeeds, roll back
//! otherwise. The scope covers metadata only; vault writes are not
//! transactional, and the coordinator compensates for that asymmetry
//! explicitly.
//!
//! The scope also carries the deferred-removal queue for two-phase deletes:
//! a row delete is committed first, and the corresponding physical paths
//! are handed back by [`TxScope::commit`] so the coordinator can remove
//! them only once the metadata delete is durable.

use std::path::PathBuf;

use sqlx::postgres::{PgConnection, PgPool, Postgres};
use sqlx::Transaction;

use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;

/// One metadata transaction plus its queue of post-commit removals.
pub struct TxScope {
    tx: Transaction<'static, Postgres>,
    deferred_removals: Vec<PathBuf>,
}

impl TxScope {
    /// Begin a new scope on the given pool.
    pub async fn begin(pool: &PgPool) -> AppResult<Self> {
        let tx = pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        Ok(Self {
            tx,
            deferred_removals: Vec::new(),
        })
    }

    /// The connection all repository calls inside this scope run on.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    /// Queue a physical path for removal after the transaction commits.
    pub fn defer_removal(&mut self, path: impl Into<PathBuf>) {
        self.deferred_removals.push(path.into());
    }

    /// Commit the transaction and hand back the queued removals.
    ///
    /// The caller owns issuing the actual vault removals; a scope must never
    /// touch the filesystem itself.
    pub async fn commit(self) -> AppResult<Vec<PathBuf>> {
        self.tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;
        Ok(self.deferred_removals)
    }

    /// Roll back the transaction, dropping any queued removals: rows that
    /// were never deleted keep their physical paths.
    pub async fn rollback(self) -> AppResult<()> {
        self.tx.rollback().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to roll back transaction", e)
        })
    }
}
