use thiserror::Error;

/// Errors that can occur while opening, running, or tearing down a bridge session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("output device open failed: {0}")]
    DeviceOpenFailed(String),

    #[error("output device write failed: {0}")]
    DeviceWriteFailed(String),

    #[error("output device close failed: {0}")]
    DeviceCloseFailed(String),

    #[error("port registration failed: {0}")]
    PortRegistrationFailed(String),

    #[error("realtime client error: {0}")]
    ClientFailed(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error("failed to spawn thread: {0}")]
    ThreadSpawn(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("timeout")]
    Timeout,
}
