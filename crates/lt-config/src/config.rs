//! Typed conversion configuration.

use std::path::{Path, PathBuf};

use lt_common::FlatFormat;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Everything a conversion run needs besides the input log path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Regex selecting channels to process, matched at the start of the name.
    pub channels: String,

    /// Regex of channels to skip; must match the whole name. Wins over `channels`.
    pub ignore: Option<String>,

    /// Separator between values in print mode.
    pub separator: String,

    /// Print flattened rows instead of storing matrices.
    pub print: bool,

    /// Print each new channel's leaf layout to stderr.
    pub print_format: bool,

    /// Append the log-relative time in seconds to every flat row.
    pub append_log_time: bool,

    /// On-disk format of the flat matrices.
    pub flat_format: FlatFormat,

    /// Emit a progress diagnostic every N decoded messages.
    pub progress_interval: u64,

    /// Type catalog files used to decode payloads.
    pub type_catalogs: Vec<PathBuf>,

    /// Output path (print target in print mode, file stem otherwise).
    pub output: Option<PathBuf>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            channels: ".*".to_string(),
            ignore: None,
            separator: " ".to_string(),
            print: false,
            print_format: false,
            append_log_time: true,
            flat_format: FlatFormat::Json,
            progress_interval: 5000,
            type_catalogs: Vec::new(),
            output: None,
        }
    }
}

impl ConvertConfig {
    /// Load from a file; `.toml` files are parsed as TOML, everything else as JSON.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::parse_toml(&content),
            _ => Self::parse_json(&content),
        }
    }

    /// Parse from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse from a TOML string.
    pub fn parse_toml(text: &str) -> Result<Self, ValidationError> {
        toml::from_str(text).map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }
}
