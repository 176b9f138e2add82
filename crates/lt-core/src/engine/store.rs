//! Column stores.
//!
//! A [`ColumnStore`] maps composed field paths to accumulated data, in
//! insertion order. During a run every field path holds a [`Slot::Series`]
//! with one entry per message; normalization later turns numeric and text
//! series into dense shapes.

use std::collections::HashMap;

use lt_common::{Matrix, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Separator between the parts of a composed field path.
pub const PATH_SEPARATOR: &str = "__";

/// Join a path prefix and a field name.
pub fn compose_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", prefix, PATH_SEPARATOR, name)
    }
}

/// One accumulated message value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Entry {
    Value(Value),
    Collapsed(Collapsed),
}

/// Result of collapsing a sequence of records.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Collapsed {
    /// One level of records gathered into a store.
    Store(ColumnStore),
    /// Outer level of a nested sequence; one item per inner sequence.
    List(Vec<Collapsed>),
}

/// Data held under one path.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Slot {
    /// Raw per-message entries, before normalization.
    Series(Vec<Entry>),
    /// Numeric column, one row per message.
    Matrix(Matrix),
    /// Scalar text column.
    Text(Vec<String>),
    /// Text sequences, one row per message.
    TextRows(Vec<Vec<String>>),
    /// Message counter.
    Count(u64),
    /// Fixed label such as the channel name.
    Label(String),
}

impl Slot {
    pub fn series() -> Self {
        Slot::Series(Vec::new())
    }
}

/// Ordered mapping from field paths to slots.
#[derive(Debug, Clone, Default)]
pub struct ColumnStore {
    slots: Vec<(String, Slot)>,
    index: HashMap<String, usize>,
}

impl ColumnStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or replace; a replaced slot keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, slot: Slot) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&i) => self.slots[i].1 = slot,
            None => {
                self.index.insert(key.clone(), self.slots.len());
                self.slots.push((key, slot));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Slot> {
        self.index.get(key).map(|&i| &self.slots[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Slot> {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.slots[i].1),
            None => None,
        }
    }

    /// Entries of a series slot; `None` if absent or already normalized.
    pub fn series_mut(&mut self, key: &str) -> Option<&mut Vec<Entry>> {
        match self.get_mut(key) {
            Some(Slot::Series(entries)) => Some(entries),
            _ => None,
        }
    }

    /// Bump a counter slot; false if `key` is not a counter.
    pub fn increment(&mut self, key: &str) -> bool {
        match self.get_mut(key) {
            Some(Slot::Count(n)) => {
                *n += 1;
                true
            }
            _ => false,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.slots.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Slot)> {
        self.slots.iter_mut().map(|(k, s)| (k.as_str(), s))
    }
}

impl PartialEq for ColumnStore {
    fn eq(&self, other: &Self) -> bool {
        self.slots == other.slots
    }
}

impl Serialize for ColumnStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for (key, slot) in &self.slots {
            map.serialize_entry(key, slot)?;
        }
        map.end()
    }
}
