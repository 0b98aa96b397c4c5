//! Error types for calmerge.

use thiserror::Error;

/// Errors that can occur in calmerge operations.
#[derive(Error, Debug)]
pub enum CalMergeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Command source error: {0}")]
    CommandSource(String),

    #[error("Refusing to delete '{0}': not an event created by calmerge")]
    NotManaged(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for calmerge operations.
pub type CalMergeResult<T> = Result<T, CalMergeError>;
