//! LCM collaborators: event log files, type catalogs, and the codec.

pub mod catalog;
pub mod codec;
pub mod eventlog;
pub mod fingerprint;
pub mod registry;

pub use catalog::{CatalogError, Dim, MemberDef, Primitive, TypeCatalog, TypeDef};
pub use codec::EncodeError;
pub use eventlog::{Event, EventLog, EventLogWriter, LogError, SYNC_WORD};
pub use registry::{DecodeError, MessageDecoder, TypeRegistry};
