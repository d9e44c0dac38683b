//! Vault (physical file tree) configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the local vault holding every user's directory tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory under which per-user trees live. Each user gets one
    /// immutable subdirectory named by their numeric id.
    #[serde(default = "default_root")]
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> String {
    "upload".to_string()
}
