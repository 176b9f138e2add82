//! Common types for LCM log tabulation.
//!
//! This crate provides foundational types shared by the config, export, and
//! core crates:
//! - The [`Record`] introspection trait and its borrowed/owned value views
//! - A row-major numeric [`Matrix`]
//! - The unified error type with stable codes
//! - Output format selection and schema versioning

pub mod error;
pub mod matrix;
pub mod output;
pub mod record;
pub mod schema;

pub use error::{Error, Result, Severity};
pub use matrix::Matrix;
pub use output::FlatFormat;
pub use record::{Field, FieldValue, Message, Record, Value};
pub use schema::SCHEMA_VERSION;
