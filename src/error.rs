use thiserror::Error;

/// Main error type for the triage pipeline
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("no decode-and-verify capability registered; every verdict would be vacuously unrecoverable")]
    MissingDecodeCapability,

    #[error("Report error: {0}")]
    Report(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for triage operations
pub type Result<T> = std::result::Result<T, TriageError>;
