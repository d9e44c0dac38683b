//! # stratus-entity
//!
//! Domain entity models for Stratus. Every struct in this crate represents
//! a database table row or a domain value object. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and database entities
//! additionally derive `sqlx::FromRow`.

pub mod file;
pub mod folder;
pub mod user;

pub use file::{CreateFile, File, FileKind};
pub use folder::{CreateFolder, Folder};
pub use user::{CreateUser, User};
