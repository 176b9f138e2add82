//! Structured aggregation.
//!
//! Mirrors a record's field tree into a [`ColumnStore`]. Nested records are
//! inlined under composed paths; every other field gets one series. In
//! [`Mode::Initialize`] the series are created empty, in [`Mode::Append`]
//! one entry per field is pushed. Sequences of records are collapsed into
//! their own stores before being pushed.

use lt_common::{FieldValue, Record};

use super::classify::{leaf_of, Leaf};
use super::collapse::collapse;
use super::store::{compose_path, ColumnStore, Entry, Slot};
use super::EngineError;

/// Whether to create keys or append values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Initialize,
    Append,
}

/// Aggregate one record into `store` under `prefix`.
///
/// Appending to a key that was never initialized is an error: the store's
/// key set is fixed by the first message of the channel.
pub fn aggregate(
    store: &mut ColumnStore,
    prefix: &str,
    record: &dyn Record,
    mode: Mode,
) -> Result<(), EngineError> {
    for field in record.fields() {
        let path = compose_path(prefix, field.name);
        match (&field.value, mode) {
            (FieldValue::Record(sub), _) => aggregate(store, &path, *sub, mode)?,
            (_, Mode::Initialize) => store.insert(path, Slot::series()),
            (value, Mode::Append) => {
                let entry = match (value, leaf_of(value).0) {
                    (FieldValue::Array(items), Leaf::Record) => {
                        Entry::Collapsed(collapse(items, &path)?)
                    }
                    _ => Entry::Value(value.to_value()),
                };
                store
                    .series_mut(&path)
                    .ok_or(EngineError::MissingColumn { field: path })?
                    .push(entry);
            }
        }
    }
    Ok(())
}
