//! Error types for the runlens viewer core.
//!
//! Uses `thiserror` for structured error variants covering backend fetches
//! and configuration. None of these are fatal to a viewer session: fetch
//! errors degrade to an empty record or an unloaded sweep.

/// Top-level error type for the runlens core library.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the backend collaborator that serves experiment and sweep logs.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("No logs found for id '{id}'")]
    NotFound { id: String },

    #[error("Backend returned status {status} for '{id}'")]
    Status { id: String, status: u16 },

    #[error("Backend connection failed: {message}")]
    Connection { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Malformed payload for '{id}': {message}")]
    Decode { id: String, message: String },
}

impl FetchError {
    /// Whether the backend answered but has no logs under the requested id.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// A type alias for results using the top-level `ViewerError`.
pub type Result<T> = std::result::Result<T, ViewerError>;
