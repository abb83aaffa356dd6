//! Chunked, cooperative reading of a byte source.
//!
//! The [`StreamReader`] never loops on its own. The host delivers two kinds
//! of events: "the source is readable" ([`StreamReader::on_readable`]) and
//! "the loop is idle" ([`StreamReader::on_idle`]). Each readable event reads
//! at most one chunk, renders it, and forwards it to the plugins; the reader
//! then waits for an idle event before arming the next read, which lets a UI
//! loop repaint between chunks.
//!
//! ```text
//! Idle --start--> Reading --data--> Draining --> Idling --idle--> Reading
//!                    |  \--would block / empty read--> Reading
//!                    |--eof--> Eof
//!                    \--error--> Error
//! any --close--> Idle
//! ```

pub mod progress;

use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::error::{HexViewError, Result};
use crate::format::{format_row, format_unaligned_byte, is_row_start, ROW_WIDTH};
use crate::io::{ByteSource, ReadStatus};
use crate::plugin::registry::PluginRegistry;
use crate::sink::{ProgressSink, ViewSinks};
use progress::{Progress, ProgressTracker};

/// Default read buffer capacity.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Reader lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// No source is open.
    Idle,
    /// A read is armed and waits for the source to become readable.
    Reading,
    /// A chunk is being rendered and dispatched.
    Draining,
    /// A chunk was dispatched; waiting for the idle step before re-arming.
    Idling,
    /// The stream ended.
    Eof,
    /// The stream failed.
    Error,
}

/// What the host has to wait for before the next event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    /// Deliver a readable event.
    Readable,
    /// The source had nothing for us; deliver a readable event later.
    Blocked,
    /// Deliver an idle event.
    Yield,
    /// Nothing left to do.
    Done,
}

/// Where a chunk goes once it has been read.
pub struct Dispatch<'a> {
    pub views: &'a mut ViewSinks,
    pub plugins: &'a mut PluginRegistry,
    pub progress: &'a mut dyn ProgressSink,
}

/// Renders `bytes`, which start at absolute `offset`, into the three columns.
///
/// The chunk is split into a leading partial row (byte by byte up to the next
/// row boundary), whole rows, and a trailing partial row (byte by byte), so
/// the output does not depend on where chunk boundaries fall.
pub fn render_chunk(views: &mut ViewSinks, offset: u64, bytes: &[u8], uppercase: bool) {
    let mut i = 0usize;
    let at = |i: usize| offset + i as u64;

    while i < bytes.len() && !is_row_start(at(i)) {
        views.append_byte(&format_unaligned_byte(at(i), bytes[i], uppercase, false));
        i += 1;
    }
    while i + ROW_WIDTH <= bytes.len() {
        views.append_row(&format_row(at(i), &bytes[i..i + ROW_WIDTH], uppercase));
        i += ROW_WIDTH;
    }
    while i < bytes.len() {
        let pos = at(i);
        views.append_byte(&format_unaligned_byte(pos, bytes[i], uppercase, is_row_start(pos)));
        i += 1;
    }
}

/// State machine reading one source chunk by chunk.
pub struct StreamReader {
    state: ReaderState,
    source: Option<Box<dyn ByteSource>>,
    buffer: Vec<u8>,
    total_size: Option<u64>,
    bytes_consumed: u64,
    chunks_delivered: u64,
    uppercase: bool,
    tracker: ProgressTracker,
}

impl StreamReader {
    pub fn new(capacity: usize, progress_interval: Duration) -> Self {
        Self {
            state: ReaderState::Idle,
            source: None,
            buffer: vec![0; capacity.max(1)],
            total_size: None,
            bytes_consumed: 0,
            chunks_delivered: 0,
            uppercase: false,
            tracker: ProgressTracker::new(progress_interval),
        }
    }

    /// Takes ownership of `source` and arms the first read.
    pub fn start(&mut self, source: Box<dyn ByteSource>) {
        self.close();
        self.total_size = source.total_size();
        debug!(source = %source.describe(), size = ?self.total_size, "Start reading");
        self.source = Some(source);
        self.state = ReaderState::Reading;
    }

    /// The update to show when reading starts.
    ///
    /// It counts against the update interval, so the first chunk read within
    /// the interval does not produce another one.
    pub fn opening_progress(&mut self) -> Option<Progress> {
        self.tracker.poll(Instant::now(), 0, self.total_size)
    }

    /// Handles a readable event: reads and dispatches at most one chunk.
    ///
    /// On a read error the source is released, the reader moves to
    /// [`ReaderState::Error`] and the error is returned.
    pub fn on_readable(&mut self, out: &mut Dispatch<'_>) -> Result<Pending> {
        match self.state {
            ReaderState::Reading => {}
            ReaderState::Idling => return Ok(Pending::Yield),
            _ => return Ok(Pending::Done),
        }
        let Some(source) = self.source.as_mut() else {
            self.state = ReaderState::Idle;
            return Ok(Pending::Done);
        };

        let status = match source.read_chunk(&mut self.buffer) {
            Ok(status) => status,
            Err(e) => {
                warn!(offset = self.bytes_consumed, error = %e, "Read failed");
                self.state = ReaderState::Error;
                self.source = None;
                out.progress.finish();
                return Err(HexViewError::Read {
                    offset: self.bytes_consumed,
                    source: e,
                });
            }
        };

        match status {
            ReadStatus::WouldBlock | ReadStatus::Data(0) => {
                trace!(offset = self.bytes_consumed, "Nothing to read yet");
                Ok(Pending::Blocked)
            }
            ReadStatus::Data(n) => {
                self.state = ReaderState::Draining;
                let n = n.min(self.buffer.len());
                let offset = self.bytes_consumed;
                let chunk = &self.buffer[..n];

                render_chunk(out.views, offset, chunk, self.uppercase);
                out.plugins.notify_read(offset, Some(chunk));

                self.bytes_consumed += n as u64;
                self.chunks_delivered += 1;
                trace!(offset, len = n, total = self.bytes_consumed, "Chunk dispatched");

                if let Some(p) = self
                    .tracker
                    .poll(Instant::now(), self.bytes_consumed, self.total_size)
                {
                    p.apply(out.progress);
                }
                self.state = ReaderState::Idling;
                Ok(Pending::Yield)
            }
            ReadStatus::Eof => {
                self.state = ReaderState::Eof;
                self.source = None;
                if self.chunks_delivered > 0 {
                    out.plugins.notify_read(self.bytes_consumed, None);
                }
                out.views.complete();
                out.progress.finish();
                debug!(
                    bytes = self.bytes_consumed,
                    chunks = self.chunks_delivered,
                    "End of stream"
                );
                Ok(Pending::Done)
            }
        }
    }

    /// Handles the idle step taken between two chunks.
    pub fn on_idle(&mut self) -> Pending {
        match self.state {
            ReaderState::Idling => {
                self.state = ReaderState::Reading;
                Pending::Readable
            }
            ReaderState::Reading => Pending::Readable,
            _ => Pending::Done,
        }
    }

    /// Cancels any armed read and releases the source.
    pub fn close(&mut self) {
        if let Some(source) = self.source.take() {
            debug!(source = %source.describe(), bytes = self.bytes_consumed, "Closing source");
        }
        self.state = ReaderState::Idle;
        self.total_size = None;
        self.bytes_consumed = 0;
        self.chunks_delivered = 0;
        self.tracker.reset();
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// True while a source is attached and reading has not finished.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            ReaderState::Reading | ReaderState::Draining | ReaderState::Idling
        )
    }

    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    pub fn total_size(&self) -> Option<u64> {
        self.total_size
    }

    pub fn chunks_delivered(&self) -> u64 {
        self.chunks_delivered
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn uppercase(&self) -> bool {
        self.uppercase
    }

    pub fn set_uppercase(&mut self, uppercase: bool) {
        self.uppercase = uppercase;
    }
}

impl Default for StreamReader {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, progress::DEFAULT_PROGRESS_INTERVAL)
    }
}
