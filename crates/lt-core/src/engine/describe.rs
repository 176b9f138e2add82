//! Human-readable description of flat row layouts.
//!
//! Lists the numeric leaves of a record in the order the flattener emits
//! them, numbered by the column each starts at:
//!
//! ```text
//! #POSE  pose_t :
//! #[
//! #1- utime
//! #2- pos(3)
//! #5- orientation(4)
//! #9- log_timestamp
//! #]
//! ```

use lt_common::{FieldValue, Record};

use super::classify::{classify, FieldKind};

/// Label of the trailing log-time column.
pub const LOG_TIME_LABEL: &str = "log_timestamp";

/// One listed leaf: its label and how many columns it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub label: String,
    pub width: usize,
}

/// Leaves of `record` in flattening order.
pub fn layout(record: &dyn Record) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    for field in record.fields() {
        let name = field.name;
        match classify(&field.value) {
            FieldKind::Scalar => leaves.push(Leaf {
                label: name.to_string(),
                width: 1,
            }),
            FieldKind::NumericArray | FieldKind::Empty => {
                let width = count_numbers(&field.value);
                leaves.push(Leaf {
                    label: format!("{}({})", name, width),
                    width,
                });
            }
            FieldKind::Text => {}
            FieldKind::Record => {
                if let FieldValue::Record(sub) = &field.value {
                    leaves.extend(layout(*sub).into_iter().map(|leaf| Leaf {
                        label: format!("{}.{}", name, leaf.label),
                        width: leaf.width,
                    }));
                }
            }
            FieldKind::RecordArray { .. } => {
                let mut records = Vec::new();
                collect_records(&field.value, &mut records);
                let inner = records.first().map(|r| layout(*r)).unwrap_or_default();
                let labels: Vec<&str> = inner.iter().map(|l| l.label.as_str()).collect();
                let per_record: usize = inner.iter().map(|l| l.width).sum();
                leaves.push(Leaf {
                    label: format!("{}<{}>({})", name, labels.join(", "), records.len()),
                    width: per_record * records.len(),
                });
            }
        }
    }
    leaves
}

/// Numbered lines, one per leaf, each starting at its first column (1-based).
pub fn numbered_lines(leaves: &[Leaf]) -> Vec<String> {
    let mut offset = 0;
    leaves
        .iter()
        .map(|leaf| {
            let line = format!("{}- {}", offset + 1, leaf.label);
            offset += leaf.width;
            line
        })
        .collect()
}

/// Full listing for a channel's first message.
pub fn format_schema(channel: &str, record: &dyn Record, with_log_time: bool) -> String {
    let mut leaves = layout(record);
    if with_log_time {
        leaves.push(Leaf {
            label: LOG_TIME_LABEL.to_string(),
            width: 1,
        });
    }

    let mut out = format!("#{}  {} :\n#[\n", channel, record.type_name());
    for line in numbered_lines(&leaves) {
        out.push('#');
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("#]\n");
    out
}

fn count_numbers(value: &FieldValue<'_>) -> usize {
    match value {
        FieldValue::Array(items) => items.iter().map(count_numbers).sum(),
        FieldValue::Text(_) | FieldValue::Record(_) => 0,
        _ => 1,
    }
}

fn collect_records<'a>(value: &FieldValue<'a>, out: &mut Vec<&'a dyn Record>) {
    match value {
        FieldValue::Record(r) => out.push(*r),
        FieldValue::Array(items) => items.iter().for_each(|item| collect_records(item, out)),
        _ => {}
    }
}
