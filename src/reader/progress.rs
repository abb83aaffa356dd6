//! Rate-limited read progress.

use std::time::{Duration, Instant};

use crate::sink::ProgressSink;

/// Default minimum delay between two progress updates.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// One progress update.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// Known total: completed fraction in [0, 1] and a percentage label.
    Determinate { fraction: f64, label: String },
    /// Unknown total: activity only.
    Pulse,
}

impl Progress {
    /// Computes progress for `consumed` bytes out of an optional total.
    pub fn compute(consumed: u64, total: Option<u64>) -> Self {
        match total {
            Some(total) => {
                let fraction = if total == 0 {
                    1.0
                } else {
                    // Files may grow while being read
                    (consumed as f64 / total as f64).min(1.0)
                };
                Progress::Determinate {
                    fraction,
                    label: format!("{:.1}%", fraction * 100.0),
                }
            }
            None => Progress::Pulse,
        }
    }

    pub fn apply(&self, sink: &mut dyn ProgressSink) {
        match self {
            Progress::Determinate { fraction, label } => sink.set_determinate(*fraction, label),
            Progress::Pulse => sink.pulse(),
        }
    }
}

/// Emits at most one [`Progress`] per interval.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns an update when the interval elapsed since the previous one.
    ///
    /// The first call after construction or [`reset`](Self::reset) always
    /// produces an update.
    pub fn poll(&mut self, now: Instant, consumed: u64, total: Option<u64>) -> Option<Progress> {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.interval {
                return None;
            }
        }
        self.last = Some(now);
        Some(Progress::compute(consumed, total))
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}
