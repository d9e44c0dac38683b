//! # stratus-storage
//!
//! The local vault: the physical side of the filesystem/metadata
//! consistency layer. Performs exactly one filesystem mutation per call and
//! reports failures with an explicit severity split so the coordinator can
//! tell expected conditions (duplicate name, missing source) apart from
//! invariant violations that mean the vault and the metadata store have
//! diverged.

pub mod vault;

pub use vault::{DriverError, DriverResult, LocalVault};
