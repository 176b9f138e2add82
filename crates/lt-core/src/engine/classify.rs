//! Field classification.
//!
//! Every field of a record falls into one of a few kinds. Sequences are
//! classified by the first element that is not itself an empty sequence, so
//! `[[], [1.0]]` is numeric and `[[], []]` carries no type information.

use std::fmt;

use lt_common::{FieldValue, Value};

/// What a field contributes to the outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Numeric or boolean scalar: one flat column.
    Scalar,
    /// Sequence (possibly nested) of numbers: one flat column per element.
    NumericArray,
    /// Text scalar or sequence of text: excluded from flat rows.
    Text,
    /// Nested record: flattened recursively.
    Record,
    /// Sequence whose elements are records, `depth` levels of nesting deep.
    RecordArray { depth: usize },
    /// Sequence with no element to inspect.
    Empty,
}

impl FieldKind {
    /// Whether the kind contributes columns to flat rows.
    pub fn is_flat(self) -> bool {
        !matches!(self, FieldKind::Text)
    }
}

/// Element type found at the bottom of nested sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    Indeterminate,
    Numeric,
    Text,
    Record,
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Leaf::Indeterminate => "nothing",
            Leaf::Numeric => "number",
            Leaf::Text => "text",
            Leaf::Record => "record",
        };
        f.write_str(name)
    }
}

/// Classify one field value.
pub fn classify(value: &FieldValue<'_>) -> FieldKind {
    match value {
        FieldValue::Bool(_) | FieldValue::Int(_) | FieldValue::Float(_) => FieldKind::Scalar,
        FieldValue::Text(_) => FieldKind::Text,
        FieldValue::Record(_) => FieldKind::Record,
        FieldValue::Array(items) => match leaf_of_items(items) {
            (Leaf::Numeric, _) => FieldKind::NumericArray,
            (Leaf::Text, _) => FieldKind::Text,
            (Leaf::Record, depth) => FieldKind::RecordArray { depth },
            (Leaf::Indeterminate, _) => FieldKind::Empty,
        },
    }
}

/// Underlying leaf of a value and the sequence depth at which it was found.
pub fn leaf_of(value: &FieldValue<'_>) -> (Leaf, usize) {
    match value {
        FieldValue::Bool(_) | FieldValue::Int(_) | FieldValue::Float(_) => (Leaf::Numeric, 0),
        FieldValue::Text(_) => (Leaf::Text, 0),
        FieldValue::Record(_) => (Leaf::Record, 0),
        FieldValue::Array(items) => leaf_of_items(items),
    }
}

/// Underlying leaf of a sequence's elements; depth counts the sequence itself.
pub fn leaf_of_items(items: &[FieldValue<'_>]) -> (Leaf, usize) {
    for item in items {
        let (leaf, depth) = leaf_of(item);
        if leaf != Leaf::Indeterminate {
            return (leaf, depth + 1);
        }
    }
    (Leaf::Indeterminate, 1)
}

/// Underlying leaf of an owned value.
pub fn leaf_of_value(value: &Value) -> Leaf {
    match value {
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => Leaf::Numeric,
        Value::Text(_) => Leaf::Text,
        Value::Record(_) => Leaf::Record,
        Value::Array(items) => items
            .iter()
            .map(leaf_of_value)
            .find(|leaf| *leaf != Leaf::Indeterminate)
            .unwrap_or(Leaf::Indeterminate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lt_common::Message;

    #[test]
    fn scalars_and_text() {
        assert_eq!(classify(&FieldValue::Int(3)), FieldKind::Scalar);
        assert_eq!(classify(&FieldValue::Bool(true)), FieldKind::Scalar);
        assert_eq!(classify(&FieldValue::Text("x")), FieldKind::Text);
        assert!(!FieldKind::Text.is_flat());
    }

    #[test]
    fn arrays_classified_by_first_informative_element() {
        let numbers = FieldValue::Array(vec![FieldValue::Array(vec![]), FieldValue::Float(1.0)]);
        assert_eq!(classify(&numbers), FieldKind::NumericArray);

        let text = FieldValue::Array(vec![FieldValue::Text("a")]);
        assert_eq!(classify(&text), FieldKind::Text);

        let empty = FieldValue::Array(vec![FieldValue::Array(vec![]), FieldValue::Array(vec![])]);
        assert_eq!(classify(&empty), FieldKind::Empty);
    }

    #[test]
    fn record_arrays_report_depth() {
        let inner = Message::new("point_t");
        let flat = FieldValue::Array(vec![FieldValue::Record(&inner)]);
        assert_eq!(classify(&flat), FieldKind::RecordArray { depth: 1 });

        let nested = FieldValue::Array(vec![
            FieldValue::Array(vec![]),
            FieldValue::Array(vec![FieldValue::Record(&inner)]),
        ]);
        assert_eq!(classify(&nested), FieldKind::RecordArray { depth: 2 });
    }

    #[test]
    fn owned_values_share_leaf_rules() {
        let v = Value::Array(vec![Value::Array(vec![]), Value::Text("t".into())]);
        assert_eq!(leaf_of_value(&v), Leaf::Text);
        assert_eq!(leaf_of_value(&Value::Array(vec![])), Leaf::Indeterminate);
    }
}
