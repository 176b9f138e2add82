//! Compiled flatteners.
//!
//! A [`Flattener`] is compiled once from a sample record and then reused for
//! every later message of the same channel. Applying it walks the record in
//! declaration order and emits every numeric leaf: scalars as one value,
//! numeric sequences in row-major order, nested records depth-first and
//! sequences of records element by element. Text fields emit nothing.
//!
//! The compiled steps address fields by position and re-check the name, so a
//! message whose shape no longer matches the sample is reported as [`Drift`]
//! instead of producing shifted columns.

use lt_common::{FieldValue, Record};

use super::classify::{classify, FieldKind};
use super::store::compose_path;

/// Per-type procedure mapping a record to its numeric leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct Flattener {
    type_name: String,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Scalar { index: usize, name: String },
    Numbers { index: usize, name: String },
    Nested { index: usize, name: String, sub: Flattener },
    NestedList { index: usize, name: String, sub: Flattener },
}

impl Step {
    fn slot(&self) -> (usize, &str) {
        match self {
            Step::Scalar { index, name }
            | Step::Numbers { index, name }
            | Step::Nested { index, name, .. }
            | Step::NestedList { index, name, .. } => (*index, name),
        }
    }
}

/// A message did not match the flattener compiled for its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    /// Path of the first field that did not match.
    pub field: String,
}

impl Drift {
    fn at(prefix: &str, name: &str) -> Self {
        Self {
            field: compose_path(prefix, name),
        }
    }
}

impl Flattener {
    /// Compile from a sample record.
    ///
    /// Sequences of records take their element layout from the first record
    /// found in the sample; an empty sequence compiles to a numeric step that
    /// stays valid while later messages keep it empty or numeric.
    pub fn compile(sample: &dyn Record) -> Self {
        let steps = sample
            .fields()
            .iter()
            .enumerate()
            .filter_map(|(index, field)| {
                let name = field.name.to_string();
                match classify(&field.value) {
                    FieldKind::Scalar => Some(Step::Scalar { index, name }),
                    FieldKind::NumericArray | FieldKind::Empty => {
                        Some(Step::Numbers { index, name })
                    }
                    FieldKind::Text => None,
                    FieldKind::Record => match &field.value {
                        FieldValue::Record(r) => Some(Step::Nested {
                            index,
                            name,
                            sub: Flattener::compile(*r),
                        }),
                        _ => None,
                    },
                    FieldKind::RecordArray { .. } => {
                        first_record(&field.value).map(|r| Step::NestedList {
                            index,
                            name,
                            sub: Flattener::compile(r),
                        })
                    }
                }
            })
            .collect();

        Self {
            type_name: sample.type_name().to_string(),
            steps,
        }
    }

    /// Type the flattener was compiled for.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Flatten one record into its numeric leaves.
    pub fn flatten(&self, record: &dyn Record) -> Result<Vec<f64>, Drift> {
        let mut out = Vec::new();
        self.flatten_into(record, "", &mut out)?;
        Ok(out)
    }

    fn flatten_into(&self, record: &dyn Record, prefix: &str, out: &mut Vec<f64>) -> Result<(), Drift> {
        let fields = record.fields();
        for step in &self.steps {
            let (index, name) = step.slot();
            let value = match fields.get(index) {
                Some(field) if field.name == name => &field.value,
                _ => return Err(Drift::at(prefix, name)),
            };

            match step {
                Step::Scalar { .. } => {
                    let v = value.as_number().ok_or_else(|| Drift::at(prefix, name))?;
                    out.push(v);
                }
                Step::Numbers { .. } => {
                    if !push_numbers(value, out) {
                        return Err(Drift::at(prefix, name));
                    }
                }
                Step::Nested { sub, .. } => match value {
                    FieldValue::Record(r) => sub.flatten_into(*r, &compose_path(prefix, name), out)?,
                    _ => return Err(Drift::at(prefix, name)),
                },
                Step::NestedList { sub, .. } => {
                    sub.flatten_list(value, &compose_path(prefix, name), out)?
                }
            }
        }
        Ok(())
    }

    fn flatten_list(&self, value: &FieldValue<'_>, path: &str, out: &mut Vec<f64>) -> Result<(), Drift> {
        match value {
            FieldValue::Record(r) => self.flatten_into(*r, path, out),
            FieldValue::Array(items) => items
                .iter()
                .try_for_each(|item| self.flatten_list(item, path, out)),
            _ => Err(Drift {
                field: path.to_string(),
            }),
        }
    }
}

/// Append every numeric leaf of `value`; false if a non-numeric leaf is found.
fn push_numbers(value: &FieldValue<'_>, out: &mut Vec<f64>) -> bool {
    match value {
        FieldValue::Array(items) => items.iter().all(|item| push_numbers(item, out)),
        other => match other.as_number() {
            Some(v) => {
                out.push(v);
                true
            }
            None => false,
        },
    }
}

fn first_record<'a>(value: &FieldValue<'a>) -> Option<&'a dyn Record> {
    match value {
        FieldValue::Record(r) => Some(*r),
        FieldValue::Array(items) => items.iter().find_map(|item| first_record(item)),
        _ => None,
    }
}
