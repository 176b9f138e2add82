//! Run state and the processing loop.

pub mod convert;
pub mod state;

use std::io::Read;

use lt_common::Error;
use tracing::info;

use crate::lcm::EventLog;

pub use convert::{Converter, Outcome};
pub use state::{ChannelOutput, ChannelState, RunState, RunStats};

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Channels in first-seen order.
    pub channels: Vec<ChannelOutput>,
    pub stats: RunStats,
    /// Whether flat rows end with the log time.
    pub with_log_time: bool,
}

impl Conversion {
    pub fn channel(&self, name: &str) -> Option<&ChannelOutput> {
        self.channels.iter().find(|c| c.name == name)
    }
}

/// Feed every event of `log` through `converter`.
///
/// Reports progress every `progress_interval` decoded messages.
pub fn run_log<R: Read>(
    converter: &mut Converter<'_>,
    log: &mut EventLog<R>,
    progress_interval: u64,
) -> Result<(), Error> {
    let interval = progress_interval.max(1);
    let mut next_report = interval;

    while let Some(event) = log.next_event()? {
        converter.process(&event)?;

        let decoded = converter.state().stats.decoded;
        if decoded >= next_report {
            next_report = decoded + interval;
            match log.progress() {
                Some(fraction) => info!(
                    messages = decoded,
                    percent = %format!("{:.1}", fraction * 100.0),
                    "read messages"
                ),
                None => info!(messages = decoded, "read messages"),
            }
        }
    }
    Ok(())
}
