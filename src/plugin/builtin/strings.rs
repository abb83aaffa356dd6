//! Streaming ASCII string extraction.
//!
//! Runs of printable characters may straddle chunk boundaries, so the
//! pending run is carried from one chunk to the next and only flushed when a
//! non-printable byte or the end of the stream is seen.

use serde::Serialize;
use serde_json::json;

use crate::plugin::{Plugin, PluginDescriptor, ViewHandle};

pub const NAME: &str = "strings";

/// Limits for string extraction.
#[derive(Debug, Clone)]
pub struct StringsConfig {
    /// Minimum length for a string candidate (in characters)
    pub min_length: usize,
    /// Maximum number of strings kept as samples
    pub max_samples: usize,
    /// Maximum number of bytes kept per string; longer runs are still
    /// counted with their full length
    pub max_length: usize,
}

impl Default for StringsConfig {
    fn default() -> Self {
        Self {
            min_length: 4,
            max_samples: 40,
            max_length: 4096,
        }
    }
}

/// One extracted string and the offset of its first byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundString {
    pub offset: u64,
    /// Full length of the run; `text` holds at most `max_length` bytes of it
    pub len: u64,
    pub text: String,
}

#[inline]
fn is_string_byte(b: u8) -> bool {
    b.is_ascii_graphic() || b == b'\t' || b == b' '
}

pub struct StringsPlugin {
    config: StringsConfig,
    view: ViewHandle,
    run: Vec<u8>,
    run_len: u64,
    run_offset: u64,
    count: u64,
    samples: Vec<FoundString>,
    complete: bool,
}

impl StringsPlugin {
    pub fn new(config: StringsConfig) -> Self {
        Self {
            config,
            view: ViewHandle::new("Strings"),
            run: Vec::new(),
            run_len: 0,
            run_offset: 0,
            count: 0,
            samples: Vec::new(),
            complete: false,
        }
    }

    fn flush(&mut self) {
        if self.run_len >= self.config.min_length as u64 {
            self.count = self.count.saturating_add(1);
            if self.samples.len() < self.config.max_samples {
                // Only ASCII bytes are collected
                let text = self.run.iter().map(|&b| b as char).collect();
                self.samples.push(FoundString {
                    offset: self.run_offset,
                    len: self.run_len,
                    text,
                });
            }
        }
        self.run.clear();
        self.run_len = 0;
    }

    /// Number of strings found so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn samples(&self) -> &[FoundString] {
        &self.samples
    }

    /// True once the end-of-stream notification was received.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

impl Plugin for StringsPlugin {
    fn view(&self) -> ViewHandle {
        self.view.clone()
    }

    fn on_read(&mut self, offset: u64, bytes: Option<&[u8]>) {
        let Some(bytes) = bytes else {
            self.flush();
            self.complete = true;
            return;
        };
        for (i, &b) in bytes.iter().enumerate() {
            if is_string_byte(b) {
                if self.run_len == 0 {
                    self.run_offset = offset + i as u64;
                }
                self.run_len += 1;
                if self.run.len() < self.config.max_length {
                    self.run.push(b);
                }
            } else if self.run_len > 0 {
                self.flush();
            }
        }
    }

    fn report(&self) -> Option<serde_json::Value> {
        Some(json!({
            "count": self.count,
            "samples": self.samples,
            "complete": self.complete,
        }))
    }
}

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new(NAME, |_| {
        Some(Box::new(StringsPlugin::new(StringsConfig::default())))
    })
    .with_display_name("Strings")
    .with_icon("edit-find")
    .with_description("Printable ASCII strings found in the document")
}
