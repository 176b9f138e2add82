//! Error types for LCM log tabulation.

use thiserror::Error;

/// Result type alias for tabulation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// How the processing loop must react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Skip the offending message and continue.
    Skip,
    /// Ignore the offending channel for the rest of the run.
    DropChannel,
    /// Abort the whole run.
    Fatal,
}

/// Unified error type for LCM log tabulation.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid type catalog: {0}")]
    InvalidCatalog(String),

    #[error("config validation failed: {0}")]
    Validation(String),

    // Log errors (20-29)
    #[error("malformed event log: {0}")]
    LogFormat(String),

    // Decode errors (30-39)
    #[error("channel {channel}: unknown type fingerprint {fingerprint:#018x}")]
    UnknownType { channel: String, fingerprint: u64 },

    #[error("channel {channel}: couldn't decode message: {reason}")]
    Decode { channel: String, reason: String },

    // Engine errors (40-49)
    #[error("channel {channel}: flattener still inconsistent at field '{field}' after recompilation")]
    SchemaDrift { channel: String, field: String },

    #[error("channel {channel}: field '{field}' is not a list of records (bottoms out at {found})")]
    CollapseBaseType {
        channel: String,
        field: String,
        found: String,
    },

    #[error("channel {channel}: field '{field}' missing from column store")]
    MissingColumn { channel: String, field: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("export failed: {0}")]
    Export(String),
}

impl Error {
    /// Returns the error code for this error type.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidCatalog(_) => 11,
            Error::Validation(_) => 12,
            Error::LogFormat(_) => 20,
            Error::UnknownType { .. } => 30,
            Error::Decode { .. } => 31,
            Error::SchemaDrift { .. } => 40,
            Error::CollapseBaseType { .. } => 41,
            Error::MissingColumn { .. } => 42,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Export(_) => 62,
        }
    }

    /// Classifies the error for the processing loop.
    pub fn severity(&self) -> Severity {
        match self {
            Error::Decode { .. } => Severity::Skip,
            Error::UnknownType { .. } | Error::SchemaDrift { .. } => Severity::DropChannel,
            _ => Severity::Fatal,
        }
    }
}
