//! Record introspection.
//!
//! Messages arrive without a schema known at compile time. Anything that can
//! list its fields in declaration order, as `(name, value)` pairs, is a
//! [`Record`]; the engine derives every output shape from that listing alone.
//!
//! Two value representations exist:
//! - [`FieldValue`] is a borrowed view handed out by [`Record::fields`].
//!   Concrete Rust message types build it on the fly from their own storage.
//! - [`Value`] is the owned mirror, used for column-store entries and for the
//!   dynamic [`Message`] produced by the LCM codec.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// A message instance whose fields can be listed at runtime.
pub trait Record: fmt::Debug {
    /// Name of the concrete message type (e.g. `pose_t`).
    fn type_name(&self) -> &str;

    /// All fields in declaration order.
    fn fields(&self) -> Vec<Field<'_>>;
}

/// One named field of a record.
#[derive(Debug, Clone)]
pub struct Field<'a> {
    pub name: &'a str,
    pub value: FieldValue<'a>,
}

impl<'a> Field<'a> {
    pub fn new(name: &'a str, value: impl Into<FieldValue<'a>>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Borrowed view of a field value.
///
/// Multi-dimensional arrays are nested `Array`s in row-major order.
#[derive(Debug, Clone)]
pub enum FieldValue<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'a str),
    Record(&'a dyn Record),
    Array(Vec<FieldValue<'a>>),
}

impl<'a> FieldValue<'a> {
    /// Build an array view from a slice of numeric or boolean elements.
    pub fn array<T>(items: &'a [T]) -> Self
    where
        T: Copy + Into<FieldValue<'a>>,
    {
        FieldValue::Array(items.iter().map(|v| (*v).into()).collect())
    }

    /// Build an array view over a slice of records.
    pub fn records<R: Record>(items: &'a [R]) -> Self {
        FieldValue::Array(
            items
                .iter()
                .map(|r| FieldValue::Record(r as &dyn Record))
                .collect(),
        )
    }

    /// Numeric value of a scalar, with booleans mapped to 0/1.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Copy the view into an owned [`Value`].
    pub fn to_value(&self) -> Value {
        match self {
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::Int(*i),
            FieldValue::Float(f) => Value::Float(*f),
            FieldValue::Text(s) => Value::Text((*s).to_string()),
            FieldValue::Record(r) => Value::Record(Message::snapshot(*r)),
            FieldValue::Array(items) => Value::Array(items.iter().map(|v| v.to_value()).collect()),
        }
    }
}

macro_rules! field_value_from {
    ($variant:ident, $target:ty: $($src:ty),+) => {
        $(
            impl<'a> From<$src> for FieldValue<'a> {
                fn from(v: $src) -> Self {
                    FieldValue::$variant(v as $target)
                }
            }
        )+
    };
}

field_value_from!(Int, i64: i8, i16, i32, i64, u8, u16, u32);
field_value_from!(Float, f64: f32, f64);

impl<'a> From<bool> for FieldValue<'a> {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(v: &'a str) -> Self {
        FieldValue::Text(v)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(v: &'a String) -> Self {
        FieldValue::Text(v.as_str())
    }
}

/// Owned field value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Array(Vec<Value>),
    Record(Message),
}

impl Value {
    /// Borrow as a [`FieldValue`].
    pub fn view(&self) -> FieldValue<'_> {
        match self {
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Int(i) => FieldValue::Int(*i),
            Value::Float(f) => FieldValue::Float(*f),
            Value::Text(s) => FieldValue::Text(s.as_str()),
            Value::Record(m) => FieldValue::Record(m),
            Value::Array(items) => FieldValue::Array(items.iter().map(Value::view).collect()),
        }
    }

    /// Numeric value of a scalar, with booleans mapped to 0/1.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer value, used for variable array dimensions.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// A dynamically typed message: a type name plus ordered fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    type_name: String,
    fields: Vec<(String, Value)>,
}

impl Message {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field append.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Deep copy of any record into a dynamic message.
    pub fn snapshot(record: &dyn Record) -> Self {
        Self {
            type_name: record.type_name().to_string(),
            fields: record
                .fields()
                .into_iter()
                .map(|f| (f.name.to_string(), f.value.to_value()))
                .collect(),
        }
    }
}

impl Record for Message {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn fields(&self) -> Vec<Field<'_>> {
        self.fields
            .iter()
            .map(|(name, value)| Field {
                name: name.as_str(),
                value: value.view(),
            })
            .collect()
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Point {
        x: f64,
        label: String,
        samples: [i32; 3],
    }

    impl Record for Point {
        fn type_name(&self) -> &str {
            "point_t"
        }

        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::new("x", self.x),
                Field::new("label", &self.label),
                Field::new("samples", FieldValue::array(&self.samples)),
            ]
        }
    }

    #[test]
    fn fields_keep_declaration_order() {
        let p = Point {
            x: 1.5,
            label: "a".into(),
            samples: [1, 2, 3],
        };
        let names: Vec<&str> = p.fields().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["x", "label", "samples"]);
    }

    #[test]
    fn snapshot_copies_nested_values() {
        let p = Point {
            x: 2.0,
            label: "b".into(),
            samples: [4, 5, 6],
        };
        let msg = Message::snapshot(&p);
        assert_eq!(msg.type_name(), "point_t");
        assert_eq!(msg.get("x"), Some(&Value::Float(2.0)));
        assert_eq!(
            msg.get("samples"),
            Some(&Value::Array(vec![Value::Int(4), Value::Int(5), Value::Int(6)]))
        );
    }

    #[test]
    fn booleans_are_numeric() {
        assert_eq!(FieldValue::Bool(true).as_number(), Some(1.0));
        assert_eq!(Value::Bool(false).as_number(), Some(0.0));
        assert_eq!(FieldValue::Text("x").as_number(), None);
    }

    #[test]
    fn message_serializes_as_ordered_map() {
        let msg = Message::new("t")
            .with("b", Value::Int(1))
            .with("a", Value::Text("z".into()));
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"b":1,"a":"z"}"#);
    }

    #[test]
    fn view_round_trips_through_to_value() {
        let v = Value::Array(vec![
            Value::Array(vec![Value::Float(1.0), Value::Float(2.0)]),
            Value::Array(vec![Value::Float(3.0), Value::Float(4.0)]),
        ]);
        assert_eq!(v.view().to_value(), v);
    }
}
