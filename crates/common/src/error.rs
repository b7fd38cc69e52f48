//! Error types for Meshgate

use thiserror::Error;

/// Result type alias using Meshgate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Meshgate error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Module load error: {0}")]
    ModuleLoad(String),

    #[error("module failed to initialize in time")]
    ModuleReadyTimeout,

    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    #[error("client constructor is not available")]
    ClientUnavailable,

    #[error("client not ready")]
    NotReady,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Grant error: {0}")]
    Grant(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the failure is routine and recoverable by retrying the
    /// operation, as opposed to a sequencing error in the caller.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::NotReady | Error::ClientUnavailable)
    }
}
