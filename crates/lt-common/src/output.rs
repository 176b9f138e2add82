//! Output format selection for flat channel matrices.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// On-disk format of the flat (one row per message) output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FlatFormat {
    /// One JSON document keyed by channel name.
    #[default]
    Json,
    /// One Parquet file per channel.
    Parquet,
}

impl fmt::Display for FlatFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatFormat::Json => write!(f, "json"),
            FlatFormat::Parquet => write!(f, "parquet"),
        }
    }
}
