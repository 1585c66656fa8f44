//! Error types for kernel assembly
//!
//! Failures while an order runs are [`warden_protocol::ProtocolError`]s and
//! end up on the wire. This type covers the setup path before any order is
//! handled.

use thiserror::Error;
use warden_protocol::ProtocolError;

/// Result type alias for kernel setup operations
pub type Result<T> = std::result::Result<T, KernelError>;

/// Errors raised while assembling a kernel
#[derive(Debug, Error)]
pub enum KernelError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Protocol-layer error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl From<toml::de::Error> for KernelError {
    fn from(e: toml::de::Error) -> Self {
        KernelError::Config(e.to_string())
    }
}
