//! Kernel configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Deployment settings for the dispatch kernel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Protocol version this endpoint runs, in `major.minor` form
    pub current_version: String,

    /// Public base URL of this deployment
    pub base_url: String,

    /// Include error context for unauthenticated callers too
    pub verbose_errors: bool,

    /// Directory holding `<id>.pem` handshake keys
    pub handshake_keys_dir: Option<PathBuf>,

    /// JSON state document; state is kept in memory when unset
    pub state_file: Option<PathBuf>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            current_version: "1.0".to_string(),
            base_url: "http://localhost".to_string(),
            verbose_errors: false,
            handshake_keys_dir: None,
            state_file: None,
        }
    }
}

impl KernelConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}
