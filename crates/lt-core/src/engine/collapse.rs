//! Array-of-record collapsing.
//!
//! A sequence of records becomes a column store of its own: keys come from
//! the first element, every element is appended, a `numMsg` counter records
//! how many there were, and the result is normalized. Sequences of sequences
//! collapse level by level into [`Collapsed::List`].

use lt_common::FieldValue;

use super::aggregate::{aggregate, Mode};
use super::classify::{leaf_of, leaf_of_items, Leaf};
use super::normalize::normalize;
use super::store::{Collapsed, ColumnStore, Slot};
use super::EngineError;

/// Key of the element counter in a collapsed store.
pub const COUNT_FIELD: &str = "numMsg";

/// Collapse a sequence whose underlying elements are records.
///
/// `field` is the path of the sequence, used for error reporting. An empty
/// sequence collapses to an empty store.
pub fn collapse(items: &[FieldValue<'_>], field: &str) -> Result<Collapsed, EngineError> {
    let (leaf, _) = leaf_of_items(items);
    if !matches!(leaf, Leaf::Record | Leaf::Indeterminate) {
        return Err(EngineError::CollapseBaseType {
            field: field.to_string(),
            found: leaf,
        });
    }

    match items.first() {
        None => Ok(Collapsed::Store(ColumnStore::new())),
        Some(FieldValue::Record(sample)) => {
            let mut store = ColumnStore::new();
            aggregate(&mut store, "", *sample, Mode::Initialize)?;
            store.insert(COUNT_FIELD, Slot::Count(0));

            for item in items {
                let FieldValue::Record(record) = item else {
                    return Err(EngineError::CollapseBaseType {
                        field: field.to_string(),
                        found: leaf_of(item).0,
                    });
                };
                aggregate(&mut store, "", *record, Mode::Append)
                    .map_err(|e| e.within(field))?;
                store.increment(COUNT_FIELD);
            }

            normalize(&mut store);
            Ok(Collapsed::Store(store))
        }
        Some(_) => items
            .iter()
            .map(|item| match item {
                FieldValue::Array(inner) => collapse(inner, field),
                other => Err(EngineError::CollapseBaseType {
                    field: field.to_string(),
                    found: leaf_of(other).0,
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Collapsed::List),
    }
}
