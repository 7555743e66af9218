//! Registry error types.

use thiserror::Error;

use tcpwatch_core::{ConfigError, HostKey};

/// Errors returned by host management operations on the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("host already monitored: {0}")]
    DuplicateHost(HostKey),

    #[error("host not found: {0}")]
    UnknownHost(HostKey),

    #[error("invalid host spec: {0}")]
    InvalidSpec(#[from] ConfigError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
