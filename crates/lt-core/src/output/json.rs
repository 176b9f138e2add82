//! JSON documents for flat and structured outputs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use lt_common::{Error, SCHEMA_VERSION};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::run::{ChannelOutput, Conversion, RunStats};

/// Suffix appended to channel names in the structured document.
pub const PARSED_SUFFIX: &str = "Parsed";

/// Header shared by both documents.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    /// Input log path.
    pub source: String,
    /// Whether flat rows end with the log time in seconds.
    pub log_time_column: bool,
    pub stats: RunStats,
}

impl Metadata {
    pub fn new(source: &Path, conversion: &Conversion) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            source: source.display().to_string(),
            log_time_column: conversion.with_log_time,
            stats: conversion.stats.clone(),
        }
    }
}

/// Flat matrices keyed by channel name.
#[derive(Serialize)]
pub struct FlatDocument<'a> {
    pub metadata: &'a Metadata,
    pub channels: FlatChannels<'a>,
}

/// Column stores keyed by `<channel>Parsed`.
#[derive(Serialize)]
pub struct StructuredDocument<'a> {
    pub metadata: &'a Metadata,
    pub channels: StructuredChannels<'a>,
}

pub struct FlatChannels<'a>(pub &'a [ChannelOutput]);

pub struct StructuredChannels<'a>(pub &'a [ChannelOutput]);

impl Serialize for FlatChannels<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for channel in self.0 {
            map.serialize_entry(&channel.name, &channel.flat)?;
        }
        map.end()
    }
}

impl Serialize for StructuredChannels<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for channel in self.0 {
            map.serialize_entry(&format!("{}{}", channel.name, PARSED_SUFFIX), &channel.structured)?;
        }
        map.end()
    }
}

pub fn flat_document<'a>(metadata: &'a Metadata, conversion: &'a Conversion) -> FlatDocument<'a> {
    FlatDocument {
        metadata,
        channels: FlatChannels(&conversion.channels),
    }
}

pub fn structured_document<'a>(
    metadata: &'a Metadata,
    conversion: &'a Conversion,
) -> StructuredDocument<'a> {
    StructuredDocument {
        metadata,
        channels: StructuredChannels(&conversion.channels),
    }
}

/// Serialize `doc` to `path` as compact JSON.
pub fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut out, doc)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ColumnStore, Slot};
    use lt_common::Matrix;

    fn conversion() -> Conversion {
        let mut store = ColumnStore::new();
        store.insert("x", Slot::Matrix(Matrix::column(vec![1.0, 2.0])));
        Conversion {
            channels: vec![ChannelOutput {
                name: "POSE".into(),
                type_name: "pose_t".into(),
                flat: Matrix::from_rows(&[vec![1.0, 0.0], vec![2.0, 0.5]]),
                structured: store,
                messages: 2,
                first_timestamp: 0,
                padding: None,
                recompilations: 0,
            }],
            stats: RunStats::default(),
            with_log_time: true,
        }
    }

    #[test]
    fn flat_document_keys_channels_by_name() {
        let conv = conversion();
        let meta = Metadata::new(Path::new("run.log"), &conv);
        let value = serde_json::to_value(flat_document(&meta, &conv)).unwrap();
        assert_eq!(value["metadata"]["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["metadata"]["source"], "run.log");
        assert_eq!(value["channels"]["POSE"][1][1], 0.5);
    }

    #[test]
    fn structured_document_uses_parsed_suffix() {
        let conv = conversion();
        let meta = Metadata::new(Path::new("run.log"), &conv);
        let value = serde_json::to_value(structured_document(&meta, &conv)).unwrap();
        assert_eq!(value["channels"]["POSEParsed"]["x"][1][0], 2.0);
    }

    #[test]
    fn writes_to_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.json");
        write_document(&path, &serde_json::json!({"k": 1})).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"k":1}"#);
    }
}
