//! # stratus-database
//!
//! PostgreSQL connection management, the per-request transaction scope, and
//! the metadata repositories (owner-scoped queries over users, folders, and
//! files).

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod scope;

pub use connection::DatabasePool;
pub use scope::TxScope;
