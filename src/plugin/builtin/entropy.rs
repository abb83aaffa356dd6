//! Byte distribution of the whole stream.
//!
//! The histogram is accumulated chunk by chunk; entropy is derived from it on
//! demand, so the report is valid at any point and final after the sentinel.

use serde_json::json;

use crate::plugin::{Plugin, PluginDescriptor, ViewHandle};

pub const NAME: &str = "entropy";

/// Byte frequency histogram.
#[derive(Debug, Clone)]
pub struct Histogram {
    counts: [u64; 256],
    total: u64,
}

impl Histogram {
    /// Creates a new empty histogram.
    #[inline]
    pub fn new() -> Self {
        Self {
            counts: [0; 256],
            total: 0,
        }
    }

    /// Adds every byte of `data`.
    #[inline]
    pub fn extend(&mut self, data: &[u8]) {
        for &byte in data {
            self.counts[byte as usize] += 1;
        }
        self.total += data.len() as u64;
    }

    /// Shannon entropy of the bytes seen so far, between 0.0 and 8.0.
    pub fn entropy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        let total = self.total as f64;
        let mut entropy = 0.0;
        for &count in &self.counts {
            if count == 0 {
                continue;
            }
            let p = (count as f64) / total;
            entropy -= p * p.log2();
        }
        entropy
    }

    /// Number of distinct byte values seen.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn count(&self, byte: u8) -> u64 {
        self.counts[byte as usize]
    }

    /// Returns the total number of bytes in the histogram.
    #[inline]
    pub fn len(&self) -> u64 {
        self.total
    }

    /// Returns true if the histogram is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EntropyPlugin {
    view: ViewHandle,
    histogram: Histogram,
    complete: bool,
}

impl EntropyPlugin {
    pub fn new() -> Self {
        Self {
            view: ViewHandle::new("Entropy"),
            histogram: Histogram::new(),
            complete: false,
        }
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }
}

impl Default for EntropyPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for EntropyPlugin {
    fn view(&self) -> ViewHandle {
        self.view.clone()
    }

    fn on_read(&mut self, _offset: u64, bytes: Option<&[u8]>) {
        match bytes {
            Some(bytes) => self.histogram.extend(bytes),
            None => self.complete = true,
        }
    }

    fn report(&self) -> Option<serde_json::Value> {
        Some(json!({
            "bytes": self.histogram.len(),
            "distinct": self.histogram.distinct(),
            "entropy": self.histogram.entropy(),
            "complete": self.complete,
        }))
    }
}

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor::new(NAME, |_| Some(Box::new(EntropyPlugin::new())))
        .with_display_name("Entropy")
        .with_description("Byte distribution and Shannon entropy of the document")
}
