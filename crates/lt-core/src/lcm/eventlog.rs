//! LCM event log files.
//!
//! A log is a sequence of events, each laid out big-endian as:
//!
//! | field         | size |
//! |---------------|------|
//! | sync word     | 4    |
//! | event number  | 8    |
//! | timestamp µs  | 8    |
//! | channel len   | 4    |
//! | data len      | 4    |
//! | channel       | n    |
//! | data          | m    |
//!
//! Garbage between events is skipped by scanning for the next sync word. A
//! truncated final event ends the log with a warning.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;
use tracing::warn;

/// Marker preceding every event.
pub const SYNC_WORD: u32 = 0xEDA1_DA01;

/// Longest channel name accepted before the header is treated as corrupt.
pub const MAX_CHANNEL_LEN: usize = 1000;

const HEADER_LEN: usize = 24;

/// One logged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_number: i64,
    /// Microseconds since the Unix epoch.
    pub timestamp: i64,
    pub channel: String,
    pub data: Vec<u8>,
}

/// Event log read errors.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error reading log: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Format(String),
}

impl From<LogError> for lt_common::Error {
    fn from(err: LogError) -> Self {
        match err {
            LogError::Io(e) => lt_common::Error::Io(e),
            LogError::Format(msg) => lt_common::Error::LogFormat(msg),
        }
    }
}

/// Sequential event reader.
pub struct EventLog<R> {
    reader: R,
    position: u64,
    size: Option<u64>,
    skipped: u64,
    done: bool,
}

impl EventLog<BufReader<File>> {
    /// Open a log file.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self::new(BufReader::new(file), Some(size)))
    }
}

impl<R: Read> EventLog<R> {
    pub fn new(reader: R, size: Option<u64>) -> Self {
        Self {
            reader,
            position: 0,
            size,
            skipped: 0,
            done: false,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Fraction of the log consumed, when the size is known.
    pub fn progress(&self) -> Option<f64> {
        self.size
            .filter(|s| *s > 0)
            .map(|s| self.position as f64 / s as f64)
    }

    /// Bytes skipped while resynchronizing.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped
    }

    /// Read the next event; `None` at end of log.
    pub fn next_event(&mut self) -> Result<Option<Event>, LogError> {
        loop {
            if !self.sync()? {
                return Ok(None);
            }

            let mut header = [0u8; HEADER_LEN];
            if !self.fill_all(&mut header)? {
                warn!(position = self.position, "truncated event header at end of log");
                return Ok(None);
            }
            let event_number = i64::from_be_bytes(word(&header[0..8]));
            let timestamp = i64::from_be_bytes(word(&header[8..16]));
            let channel_len = u32::from_be_bytes(word(&header[16..20])) as usize;
            let data_len = u32::from_be_bytes(word(&header[20..24])) as u64;

            if channel_len == 0 || channel_len > MAX_CHANNEL_LEN {
                warn!(
                    position = self.position,
                    channel_len, "implausible channel length; resynchronizing"
                );
                continue;
            }

            let mut channel = vec![0u8; channel_len];
            if !self.fill_all(&mut channel)? {
                warn!(position = self.position, "truncated channel name at end of log");
                return Ok(None);
            }

            let mut data = Vec::new();
            let read = (&mut self.reader).take(data_len).read_to_end(&mut data)?;
            self.position += read as u64;
            if (read as u64) < data_len {
                warn!(
                    event_number,
                    expected = data_len,
                    read,
                    "truncated event at end of log"
                );
                return Ok(None);
            }

            return Ok(Some(Event {
                event_number,
                timestamp,
                channel: String::from_utf8_lossy(&channel).into_owned(),
                data,
            }));
        }
    }

    /// Advance past the next sync word; false at end of input.
    fn sync(&mut self) -> Result<bool, LogError> {
        let start = self.position;
        let mut bytes = [0u8; 4];
        let n = self.fill(&mut bytes)?;
        if n == 0 {
            return Ok(false);
        }
        if n < bytes.len() {
            warn!(position = start, "trailing bytes at end of log");
            return Ok(false);
        }

        let mut window = u32::from_be_bytes(bytes);
        if window != SYNC_WORD && start == 0 {
            return Err(LogError::Format(
                "input does not start with an LCM sync word".to_string(),
            ));
        }

        let mut skipped = 0u64;
        while window != SYNC_WORD {
            let mut byte = [0u8; 1];
            if self.fill(&mut byte)? == 0 {
                self.skipped += skipped + 4;
                warn!(position = start, skipped = skipped + 4, "no sync word before end of log");
                return Ok(false);
            }
            window = (window << 8) | byte[0] as u32;
            skipped += 1;
        }
        if skipped > 0 {
            self.skipped += skipped;
            warn!(position = start, skipped, "skipped corrupt bytes to resynchronize");
        }
        Ok(true)
    }

    /// Read until `buf` is full or input ends; returns bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }

    fn fill_all(&mut self, buf: &mut [u8]) -> Result<bool, LogError> {
        Ok(self.fill(buf)? == buf.len())
    }
}

impl<R: Read> Iterator for EventLog<R> {
    type Item = Result<Event, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn word<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

/// Sequential event writer; event numbers start at zero.
pub struct EventLogWriter<W: Write> {
    writer: W,
    next_event: i64,
}

impl EventLogWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> EventLogWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            next_event: 0,
        }
    }

    pub fn write_event(&mut self, timestamp: i64, channel: &str, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(&SYNC_WORD.to_be_bytes())?;
        self.writer.write_all(&self.next_event.to_be_bytes())?;
        self.writer.write_all(&timestamp.to_be_bytes())?;
        self.writer.write_all(&(channel.len() as u32).to_be_bytes())?;
        self.writer.write_all(&(data.len() as u32).to_be_bytes())?;
        self.writer.write_all(channel.as_bytes())?;
        self.writer.write_all(data)?;
        self.next_event += 1;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
