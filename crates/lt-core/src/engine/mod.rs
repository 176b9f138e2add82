//! Type-driven flatten/aggregate engine.
//!
//! Nothing here knows about LCM: the engine only sees [`lt_common::Record`]
//! values and derives every output shape from their field listings.

pub mod aggregate;
pub mod classify;
pub mod collapse;
pub mod describe;
pub mod flatten;
pub mod normalize;
pub mod pad;
pub mod store;

pub use aggregate::{aggregate, Mode};
pub use classify::{classify, FieldKind, Leaf};
pub use collapse::{collapse, COUNT_FIELD};
pub use describe::format_schema;
pub use flatten::{Drift, Flattener};
pub use normalize::normalize;
pub use pad::{pad_rows, PadReport};
pub use store::{compose_path, Collapsed, ColumnStore, Entry, Slot, PATH_SEPARATOR};

use thiserror::Error;

/// Fatal schema errors raised while aggregating.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("field '{field}' is not a list of records (bottoms out at {found})")]
    CollapseBaseType { field: String, found: Leaf },

    #[error("field '{field}' missing from column store")]
    MissingColumn { field: String },
}

impl EngineError {
    /// Re-root the field path under `parent`.
    pub fn within(self, parent: &str) -> Self {
        match self {
            EngineError::CollapseBaseType { field, found } => EngineError::CollapseBaseType {
                field: compose_path(parent, &field),
                found,
            },
            EngineError::MissingColumn { field } => EngineError::MissingColumn {
                field: compose_path(parent, &field),
            },
        }
    }

    /// Attach the channel name.
    pub fn on_channel(self, channel: &str) -> lt_common::Error {
        let channel = channel.to_string();
        match self {
            EngineError::CollapseBaseType { field, found } => lt_common::Error::CollapseBaseType {
                channel,
                field,
                found: found.to_string(),
            },
            EngineError::MissingColumn { field } => {
                lt_common::Error::MissingColumn { channel, field }
            }
        }
    }
}
