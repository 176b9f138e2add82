//! Arrow schema for flat channel tables.
//!
//! A flat table has one row per message and one `Float64` column per leaf
//! value, named `c0..cN`. When rows carry the log time it is the last
//! column and is named [`LOG_TIME_COLUMN`].

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use lt_common::Matrix;

/// Name of the trailing log-time column.
pub const LOG_TIME_COLUMN: &str = "log_time";

/// Schema for a flat table `width` columns wide.
pub fn flat_schema(width: usize, with_log_time: bool) -> Schema {
    let leaves = if with_log_time {
        width.saturating_sub(1)
    } else {
        width
    };

    let mut fields: Vec<Field> = (0..leaves)
        .map(|i| Field::new(format!("c{}", i), DataType::Float64, false))
        .collect();
    if with_log_time && width > 0 {
        fields.push(Field::new(LOG_TIME_COLUMN, DataType::Float64, false));
    }

    Schema::new(fields)
}

/// Convert a matrix into a record batch; columns follow `schema` order.
pub fn matrix_to_batch(matrix: &Matrix, schema: Arc<Schema>) -> Result<RecordBatch, ArrowError> {
    if schema.fields().len() != matrix.cols() {
        return Err(ArrowError::SchemaError(format!(
            "schema has {} columns, matrix has {}",
            schema.fields().len(),
            matrix.cols()
        )));
    }

    let columns: Vec<ArrayRef> = (0..matrix.cols())
        .map(|c| Arc::new(Float64Array::from(matrix.column_values(c))) as ArrayRef)
        .collect();

    RecordBatch::try_new(schema, columns)
}
