//! Per-run and per-channel state.

use std::collections::{HashMap, HashSet};

use lt_common::{Matrix, Record, Value};
use serde::Serialize;
use tracing::warn;

use crate::engine::{
    aggregate, normalize, pad_rows, ColumnStore, EngineError, Entry, Flattener, Mode, PadReport,
    Slot, COUNT_FIELD,
};

/// Store key holding each message's log time.
pub const LOG_TIME_FIELD: &str = "logTime";
/// Store key holding the channel name.
pub const CHANNEL_FIELD: &str = "channel";
/// Store key holding the message type name.
pub const TYPENAME_FIELD: &str = "typename";

/// Everything accumulated for one channel.
#[derive(Debug)]
pub struct ChannelState {
    pub name: String,
    pub type_name: String,
    pub flattener: Flattener,
    /// Flattened leaves per message, without the log time.
    pub rows: Vec<Vec<f64>>,
    pub log_times: Vec<f64>,
    pub store: ColumnStore,
    pub message_count: u64,
    pub first_timestamp: i64,
    pub recompilations: u32,
}

impl ChannelState {
    /// Discover the channel's schema from its first decoded message.
    pub fn new(name: &str, timestamp: i64, sample: &dyn Record) -> Result<Self, EngineError> {
        let mut store = ColumnStore::new();
        aggregate(&mut store, "", sample, Mode::Initialize)?;

        let metadata = [
            (LOG_TIME_FIELD, Slot::series()),
            (CHANNEL_FIELD, Slot::Label(name.to_string())),
            (TYPENAME_FIELD, Slot::Label(sample.type_name().to_string())),
            (COUNT_FIELD, Slot::Count(0)),
        ];
        for (key, slot) in metadata {
            if store.contains(key) {
                warn!(channel = name, field = key, "message field shadows channel metadata");
            } else {
                store.insert(key, slot);
            }
        }

        Ok(Self {
            name: name.to_string(),
            type_name: sample.type_name().to_string(),
            flattener: Flattener::compile(sample),
            rows: Vec::new(),
            log_times: Vec::new(),
            store,
            message_count: 0,
            first_timestamp: timestamp,
            recompilations: 0,
        })
    }

    /// Record one message: its flat row and its structured values.
    pub fn push(&mut self, row: Vec<f64>, log_time: f64, record: &dyn Record) -> Result<(), EngineError> {
        aggregate(&mut self.store, "", record, Mode::Append)?;
        if let Some(times) = self.store.series_mut(LOG_TIME_FIELD) {
            times.push(Entry::Value(Value::Float(log_time)));
        }
        self.store.increment(COUNT_FIELD);

        self.rows.push(row);
        self.log_times.push(log_time);
        self.message_count += 1;
        Ok(())
    }

    /// Pad and normalize; log times become the last flat column.
    pub fn finish(mut self, with_log_time: bool) -> ChannelOutput {
        let padding = pad_rows(&mut self.rows);
        if let Some(report) = padding {
            warn!(
                channel = %self.name,
                min = report.min,
                max = report.max,
                "padding channel with zeros"
            );
        }
        if with_log_time {
            for (row, t) in self.rows.iter_mut().zip(&self.log_times) {
                row.push(*t);
            }
        }
        normalize(&mut self.store);

        ChannelOutput {
            flat: Matrix::from_rows(&self.rows),
            name: self.name,
            type_name: self.type_name,
            structured: self.store,
            messages: self.message_count,
            first_timestamp: self.first_timestamp,
            padding,
            recompilations: self.recompilations,
        }
    }
}

/// Finished outputs of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelOutput {
    pub name: String,
    pub type_name: String,
    pub flat: Matrix,
    pub structured: ColumnStore,
    pub messages: u64,
    pub first_timestamp: i64,
    pub padding: Option<PadReport>,
    pub recompilations: u32,
}

/// Counters for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Events read from the log.
    pub events: u64,
    /// Messages decoded on accepted channels.
    pub decoded: u64,
    /// Events dropped because their channel is ignored.
    pub ignored_events: u64,
    /// Channels ignored because of an unknown type.
    pub unknown_types: u64,
    pub decode_failures: u64,
    pub recompilations: u64,
    pub dropped_channels: u64,
}

/// State owned by the processing loop.
#[derive(Debug, Default)]
pub struct RunState {
    channels: Vec<ChannelState>,
    index: HashMap<String, usize>,
    ignored: HashSet<String>,
    start_time: Option<i64>,
    pub stats: RunStats,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp of the first decoded message, recording it if unset.
    pub fn mark_start(&mut self, timestamp: i64) -> i64 {
        *self.start_time.get_or_insert(timestamp)
    }

    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    pub fn is_ignored(&self, channel: &str) -> bool {
        self.ignored.contains(channel)
    }

    /// Add a channel to the permanent ignore set; false if already there.
    pub fn ignore(&mut self, channel: &str) -> bool {
        self.ignored.insert(channel.to_string())
    }

    pub fn ignored(&self) -> impl Iterator<Item = &str> {
        self.ignored.iter().map(String::as_str)
    }

    pub fn index_of(&self, channel: &str) -> Option<usize> {
        self.index.get(channel).copied()
    }

    /// Register a new channel; returns its index.
    pub fn add_channel(&mut self, state: ChannelState) -> usize {
        let idx = self.channels.len();
        self.index.insert(state.name.clone(), idx);
        self.channels.push(state);
        idx
    }

    pub fn channel(&self, channel: &str) -> Option<&ChannelState> {
        self.index_of(channel).map(|i| &self.channels[i])
    }

    pub(crate) fn channel_at_mut(&mut self, idx: usize) -> &mut ChannelState {
        &mut self.channels[idx]
    }

    /// Channels in first-seen order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelState> {
        self.channels.iter()
    }

    pub fn into_channels(self) -> Vec<ChannelState> {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lt_common::Message;

    fn sample(v: f64, n: usize) -> Message {
        Message::new("scan_t")
            .with("v", Value::Float(v))
            .with("r", Value::Array(vec![Value::Float(v); n]))
    }

    #[test]
    fn new_channel_adds_metadata_after_fields() {
        let chan = ChannelState::new("SCAN", 5, &sample(1.0, 2)).unwrap();
        assert_eq!(
            chan.store.keys().collect::<Vec<_>>(),
            vec!["v", "r", LOG_TIME_FIELD, CHANNEL_FIELD, TYPENAME_FIELD, COUNT_FIELD]
        );
        assert_eq!(chan.store.get(TYPENAME_FIELD), Some(&Slot::Label("scan_t".into())));
    }

    #[test]
    fn finish_pads_before_appending_log_time() {
        let mut chan = ChannelState::new("SCAN", 0, &sample(1.0, 1)).unwrap();
        for (i, n) in [1usize, 3].iter().enumerate() {
            let msg = sample(i as f64, *n);
            let row = chan.flattener.flatten(&msg).unwrap();
            chan.push(row, i as f64 * 0.5, &msg).unwrap();
        }
        let out = chan.finish(true);
        assert_eq!(out.padding.map(|p| (p.min, p.max)), Some((2, 4)));
        assert_eq!(out.flat.row(0), &[0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(out.flat.row(1), &[1.0, 1.0, 1.0, 1.0, 0.5]);
        assert_eq!(out.structured.get(COUNT_FIELD), Some(&Slot::Count(2)));
        assert_eq!(
            out.structured.get(LOG_TIME_FIELD),
            Some(&Slot::Matrix(Matrix::column(vec![0.0, 0.5])))
        );
    }

    #[test]
    fn shadowing_field_keeps_message_column() {
        let msg = Message::new("odd_t").with("channel", Value::Int(3));
        let chan = ChannelState::new("ODD", 0, &msg).unwrap();
        assert_eq!(chan.store.get(CHANNEL_FIELD), Some(&Slot::series()));
    }

    #[test]
    fn run_state_tracks_start_and_ignores() {
        let mut state = RunState::new();
        assert_eq!(state.mark_start(100), 100);
        assert_eq!(state.mark_start(200), 100);
        assert!(state.ignore("CAM"));
        assert!(!state.ignore("CAM"));
        assert!(state.is_ignored("CAM"));

        let idx = state.add_channel(ChannelState::new("A", 100, &sample(0.0, 0)).unwrap());
        assert_eq!(state.index_of("A"), Some(idx));
        assert_eq!(state.channels().count(), 1);
    }
}
