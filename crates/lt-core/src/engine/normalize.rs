//! Post-pass normalization of column stores.
//!
//! Runs once per store at end of stream (and once per collapsed element
//! store). Each series is converted according to its underlying leaf type:
//! numeric series become a matrix with one row per message, text series
//! become string lists, and series of records or of nothing but empty
//! sequences are left as they are.

use lt_common::{Matrix, Value};
use tracing::warn;

use super::classify::{leaf_of_value, Leaf};
use super::store::{ColumnStore, Entry, Slot};

/// Normalize every series in `store` in place.
pub fn normalize(store: &mut ColumnStore) {
    for (key, slot) in store.iter_mut() {
        let Slot::Series(entries) = &*slot else {
            continue;
        };
        let replacement = match underlying(entries) {
            Leaf::Indeterminate | Leaf::Record => continue,
            Leaf::Text => text_slot(entries),
            Leaf::Numeric => Slot::Matrix(numeric_matrix(key, entries)),
        };
        *slot = replacement;
    }
}

fn underlying(entries: &[Entry]) -> Leaf {
    entries
        .iter()
        .map(|entry| match entry {
            Entry::Value(v) => leaf_of_value(v),
            Entry::Collapsed(_) => Leaf::Record,
        })
        .find(|leaf| *leaf != Leaf::Indeterminate)
        .unwrap_or(Leaf::Indeterminate)
}

fn numeric_matrix(key: &str, entries: &[Entry]) -> Matrix {
    let scalars: Option<Vec<f64>> = entries
        .iter()
        .map(|entry| match entry {
            Entry::Value(Value::Array(_)) | Entry::Collapsed(_) => None,
            Entry::Value(v) => v.as_number(),
        })
        .collect();
    if let Some(values) = scalars {
        return Matrix::column(values);
    }

    let rows: Vec<Vec<f64>> = entries
        .iter()
        .map(|entry| {
            let mut row = Vec::new();
            if let Entry::Value(v) = entry {
                push_numbers(v, &mut row);
            }
            row
        })
        .collect();

    let min = rows.iter().map(Vec::len).min().unwrap_or(0);
    let max = rows.iter().map(Vec::len).max().unwrap_or(0);
    if min != max {
        warn!(column = key, min, max, "ragged column padded with zeros");
    }
    Matrix::from_rows(&rows)
}

fn push_numbers(value: &Value, out: &mut Vec<f64>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| push_numbers(item, out)),
        other => out.push(other.as_number().unwrap_or(f64::NAN)),
    }
}

fn text_slot(entries: &[Entry]) -> Slot {
    let scalars: Option<Vec<String>> = entries
        .iter()
        .map(|entry| match entry {
            Entry::Value(Value::Text(s)) => Some(s.clone()),
            _ => None,
        })
        .collect();
    if let Some(strings) = scalars {
        return Slot::Text(strings);
    }

    Slot::TextRows(
        entries
            .iter()
            .map(|entry| {
                let mut row = Vec::new();
                if let Entry::Value(v) = entry {
                    push_texts(v, &mut row);
                }
                row
            })
            .collect(),
    )
}

fn push_texts(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Text(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|item| push_texts(item, out)),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Int(i) => out.push(i.to_string()),
        Value::Float(f) => out.push(f.to_string()),
        Value::Record(_) => {}
    }
}
