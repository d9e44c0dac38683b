//! Shared value types used across crates.

pub mod response;

pub use response::{ApiSuccess, Listing};
