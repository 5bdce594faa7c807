//! Error types for s3-assets

use thiserror::Error;

/// Result type alias for s3-assets operations
pub type Result<T> = std::result::Result<T, AssetError>;

/// Main error type for s3-assets
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider failures (credentials, missing bucket, name collisions,
    /// network). The provider's message is kept verbatim.
    #[error("Cloud storage error: {0}")]
    CloudStorage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AssetError {
    /// Whether the failure came from the object store rather than the local side
    pub fn is_remote(&self) -> bool {
        matches!(self, AssetError::CloudStorage(_))
    }

    /// Process exit code used by the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            AssetError::Config(_) | AssetError::InvalidInput(_) => 2,
            AssetError::CloudStorage(_) => 3,
            _ => 1,
        }
    }
}
