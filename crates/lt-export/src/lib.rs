//! Flat channel matrix export.
//!
//! This crate provides:
//! - Arrow schema definitions for flat channel tables
//! - A Parquet writer with compression
//! - File naming helpers for per-channel outputs

pub mod schema;
pub mod writer;

pub use schema::{flat_schema, matrix_to_batch, LOG_TIME_COLUMN};
pub use writer::{channel_file_name, write_matrix, ExportError, WriterConfig};
