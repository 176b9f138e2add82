//! Per-message processing.
//!
//! [`Converter`] takes events (or already decoded records) one at a time
//! and routes each through channel selection, decoding, flattening and
//! aggregation. Non-fatal problems are logged and reported as an
//! [`Outcome`]; fatal schema errors are returned as `Err`.

use std::io::{self, Write};

use lt_common::{Error, Record, Severity};
use lt_config::{ChannelFilter, ConvertConfig};
use tracing::{debug, error, info, warn};

use super::state::{ChannelState, RunState};
use super::Conversion;
use crate::engine::{format_schema, Flattener};
use crate::lcm::{Event, MessageDecoder};

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Flattened and aggregated.
    Stored,
    /// Flattened and printed.
    Printed,
    /// Channel filtered out or previously ignored.
    Ignored,
    /// Unknown fingerprint; the channel is now ignored.
    UnknownType,
    /// Payload could not be decoded; the message was skipped.
    DecodeFailed,
    /// Flattening kept failing after recompilation; the channel is now ignored.
    ChannelDropped,
}

enum Sink<'a> {
    Store,
    Print(Box<dyn Write + 'a>),
}

/// Drives one conversion run.
pub struct Converter<'a> {
    decoder: &'a dyn MessageDecoder,
    filter: ChannelFilter,
    separator: String,
    print_format: bool,
    append_log_time: bool,
    sink: Sink<'a>,
    listing: Box<dyn Write + 'a>,
    state: RunState,
}

impl<'a> Converter<'a> {
    /// Converter storing matrices; schema listings go to stderr.
    pub fn new(config: &ConvertConfig, decoder: &'a dyn MessageDecoder) -> Result<Self, Error> {
        Ok(Self {
            decoder,
            filter: ChannelFilter::from_config(config)?,
            separator: config.separator.clone(),
            print_format: config.print_format,
            append_log_time: config.append_log_time,
            sink: Sink::Store,
            listing: Box::new(io::stderr()),
            state: RunState::new(),
        })
    }

    /// Print flattened rows to `out` instead of storing them.
    pub fn print_to(mut self, out: impl Write + 'a) -> Self {
        self.sink = Sink::Print(Box::new(out));
        self
    }

    /// Send schema listings to `out` instead of stderr.
    pub fn list_schemas_to(mut self, out: impl Write + 'a) -> Self {
        self.listing = Box::new(out);
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Process one raw log event.
    pub fn process(&mut self, event: &Event) -> Result<Outcome, Error> {
        self.state.stats.events += 1;
        let channel = event.channel.as_str();

        if self.state.is_ignored(channel) {
            self.state.stats.ignored_events += 1;
            return Ok(Outcome::Ignored);
        }
        if !self.filter.accepts(channel) {
            debug!(channel, "ignoring channel");
            self.state.ignore(channel);
            self.state.stats.ignored_events += 1;
            return Ok(Outcome::Ignored);
        }

        match self.decoder.decode(&event.data) {
            Ok(record) => self.process_record(channel, event.timestamp, record.as_ref()),
            Err(e) => {
                debug!(channel, event_number = event.event_number, "decode failed");
                self.settle(channel, e.on_channel(channel))
            }
        }
    }

    /// Process one decoded message.
    ///
    /// The first message that gets here fixes the zero point of the log time.
    pub fn process_record(
        &mut self,
        channel: &str,
        timestamp: i64,
        record: &dyn Record,
    ) -> Result<Outcome, Error> {
        if self.state.is_ignored(channel) {
            self.state.stats.ignored_events += 1;
            return Ok(Outcome::Ignored);
        }
        let start = self.state.mark_start(timestamp);
        self.state.stats.decoded += 1;

        let idx = match self.state.index_of(channel) {
            Some(idx) => idx,
            None => match self.discover(channel, timestamp, record) {
                Ok(idx) => idx,
                Err(err) => return self.settle(channel, err),
            },
        };

        let row = match self.flatten(idx, channel, record) {
            Ok(row) => row,
            Err(err) => return self.settle(channel, err),
        };
        let log_time = (timestamp - start) as f64 / 1e6;

        if let Sink::Print(out) = &mut self.sink {
            let log_time = self.append_log_time.then_some(log_time);
            write_row(out, channel, &row, log_time, &self.separator)?;
            return Ok(Outcome::Printed);
        }

        let pushed = self
            .state
            .channel_at_mut(idx)
            .push(row, log_time, record)
            .map_err(|e| e.on_channel(channel));
        match pushed {
            Ok(()) => Ok(Outcome::Stored),
            Err(err) => self.settle(channel, err),
        }
    }

    /// React to a per-message error according to its severity.
    fn settle(&mut self, channel: &str, err: Error) -> Result<Outcome, Error> {
        match err.severity() {
            Severity::Skip => {
                warn!(channel, error = %err, "couldn't decode message; skipping");
                self.state.stats.decode_failures += 1;
                Ok(Outcome::DecodeFailed)
            }
            Severity::DropChannel => {
                self.state.ignore(channel);
                if let Error::UnknownType { .. } = err {
                    warn!(channel, error = %err, "unknown message type; ignoring channel");
                    self.state.stats.unknown_types += 1;
                    Ok(Outcome::UnknownType)
                } else {
                    error!(channel, error = %err, "dropping channel");
                    self.state.stats.dropped_channels += 1;
                    Ok(Outcome::ChannelDropped)
                }
            }
            Severity::Fatal => Err(err),
        }
    }

    fn discover(&mut self, channel: &str, timestamp: i64, record: &dyn Record) -> Result<usize, Error> {
        let state = ChannelState::new(channel, timestamp, record).map_err(|e| e.on_channel(channel))?;
        info!(channel, type_name = record.type_name(), "new channel");
        if self.print_format {
            let listing = format_schema(channel, record, self.append_log_time);
            self.listing.write_all(listing.as_bytes())?;
        }
        Ok(self.state.add_channel(state))
    }

    /// Flatten with one recompilation on drift.
    fn flatten(&mut self, idx: usize, channel: &str, record: &dyn Record) -> Result<Vec<f64>, Error> {
        let chan = self.state.channel_at_mut(idx);
        let drift = match chan.flattener.flatten(record) {
            Ok(row) => return Ok(row),
            Err(drift) => drift,
        };
        warn!(channel, field = %drift.field, "needed to create new flattener for channel");

        chan.flattener = Flattener::compile(record);
        chan.recompilations += 1;
        let retry = chan.flattener.flatten(record);
        self.state.stats.recompilations += 1;

        retry.map_err(|drift| Error::SchemaDrift {
            channel: channel.to_string(),
            field: drift.field,
        })
    }

    /// Finalize every channel.
    pub fn finish(mut self) -> Result<Conversion, Error> {
        if let Sink::Print(out) = &mut self.sink {
            out.flush()?;
        }
        self.listing.flush()?;

        let stats = self.state.stats.clone();
        let with_log_time = self.append_log_time;
        let channels: Vec<_> = self
            .state
            .into_channels()
            .into_iter()
            .filter(|c| {
                if c.message_count == 0 {
                    debug!(channel = %c.name, "no stored messages; leaving channel out of outputs");
                }
                c.message_count > 0
            })
            .map(|c| c.finish(with_log_time))
            .collect();

        info!(
            events = stats.events,
            decoded = stats.decoded,
            channels = channels.len(),
            "loaded all messages"
        );
        Ok(Conversion {
            channels,
            stats,
            with_log_time,
        })
    }
}

fn write_row(
    out: &mut dyn Write,
    channel: &str,
    row: &[f64],
    log_time: Option<f64>,
    separator: &str,
) -> io::Result<()> {
    write!(out, "{}", channel)?;
    for v in row.iter().chain(log_time.iter()) {
        write!(out, "{}{}", separator, v)?;
    }
    writeln!(out)
}
