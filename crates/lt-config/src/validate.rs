//! Semantic validation of a resolved configuration.

use lt_common::FlatFormat;
use regex::Regex;
use thiserror::Error;

use crate::config::ConvertConfig;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0}")]
    IoError(String),

    #[error("{0}")]
    ParseError(String),

    #[error("invalid regex for '{field}': {reason}")]
    InvalidPattern { field: &'static str, reason: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("conflicting options: {0}")]
    Conflict(String),
}

impl From<ValidationError> for lt_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::IoError(msg) | ValidationError::ParseError(msg) => {
                lt_common::Error::Config(msg)
            }
            other => lt_common::Error::Validation(other.to_string()),
        }
    }
}

/// Check a configuration for semantic errors.
pub fn validate(config: &ConvertConfig) -> Result<(), ValidationError> {
    Regex::new(&config.channels).map_err(|e| ValidationError::InvalidPattern {
        field: "channels",
        reason: e.to_string(),
    })?;

    if let Some(ignore) = &config.ignore {
        Regex::new(ignore).map_err(|e| ValidationError::InvalidPattern {
            field: "ignore",
            reason: e.to_string(),
        })?;
    }

    if config.separator.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "separator",
            reason: "must not be empty".to_string(),
        });
    }

    if config.progress_interval == 0 {
        return Err(ValidationError::InvalidValue {
            field: "progress_interval",
            reason: "must be greater than zero".to_string(),
        });
    }

    if config.print && config.flat_format == FlatFormat::Parquet {
        return Err(ValidationError::Conflict(
            "print mode writes text rows; it cannot be combined with parquet output".to_string(),
        ));
    }

    Ok(())
}
