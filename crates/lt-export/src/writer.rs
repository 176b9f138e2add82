//! Parquet writer for flat channel matrices.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use arrow::error::ArrowError;
use lt_common::Matrix;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use thiserror::Error;
use tracing::debug;

use crate::schema::{flat_schema, matrix_to_batch};

/// Errors from the export layer.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("channel '{0}' has no columns to write")]
    EmptyChannel(String),
}

impl From<ExportError> for lt_common::Error {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Io(e) => lt_common::Error::Io(e),
            other => lt_common::Error::Export(other.to_string()),
        }
    }
}

/// Writer settings.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Directory receiving one file per channel.
    pub output_dir: PathBuf,
    /// Whether the last column of every row is the log time.
    pub with_log_time: bool,
    /// Parquet compression codec.
    pub compression: Compression,
}

impl WriterConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            with_log_time: true,
            compression: Compression::ZSTD(ZstdLevel::default()),
        }
    }

    pub fn with_log_time(mut self, enabled: bool) -> Self {
        self.with_log_time = enabled;
        self
    }
}

/// File name for a channel: characters outside `[A-Za-z0-9_.-]` become `_`.
pub fn channel_file_name(channel: &str) -> String {
    let stem: String = channel
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.parquet", stem)
}

/// Write one channel's flat matrix; returns the written path.
pub fn write_matrix(
    config: &WriterConfig,
    channel: &str,
    matrix: &Matrix,
) -> Result<PathBuf, ExportError> {
    if matrix.cols() == 0 {
        return Err(ExportError::EmptyChannel(channel.to_string()));
    }

    fs::create_dir_all(&config.output_dir)?;
    let path = config.output_dir.join(channel_file_name(channel));

    let schema = Arc::new(flat_schema(matrix.cols(), config.with_log_time));
    let batch = matrix_to_batch(matrix, schema.clone())?;

    let props = WriterProperties::builder()
        .set_compression(config.compression)
        .build();
    let file = File::create(&path)?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    debug!(channel, rows = matrix.rows(), path = %path.display(), "wrote parquet");
    Ok(path)
}
