//! LCM event log tabulation.
//!
//! Turns a log of timestamped, channel-tagged LCM messages into per-channel
//! tables without any schema declared up front:
//! - [`engine`]: the type-driven flatten/aggregate engine
//! - [`lcm`]: event log reader, type catalog, fingerprints, and codec
//! - [`run`]: per-channel run state and the processing loop
//! - [`output`]: JSON and Parquet persistence of finished channels
//! - [`cli`]: the `lt-core` command line

pub mod cli;
pub mod engine;
pub mod exit_codes;
pub mod lcm;
pub mod output;
pub mod run;

pub use engine::{ColumnStore, Flattener, Slot};
pub use run::{Conversion, Converter, Outcome, RunState};
