//! # stratus-core
//!
//! Core crate for Stratus. Contains configuration schemas, the name policy
//! guarding user-supplied folder/file names, shared response types, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Stratus crates.

pub mod config;
pub mod error;
pub mod name;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
