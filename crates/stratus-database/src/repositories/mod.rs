//! Metadata repositories.
//!
//! Every query function is generic over [`sqlx::PgExecutor`] so the same
//! statement can run against the pool or inside a [`crate::TxScope`]. All
//! list/find operations filter by the acting user's id; the explicit
//! `global` variants invert that filter (exclude the acting user, require
//! `is_public`).

pub mod file;
pub mod folder;
pub mod user;
