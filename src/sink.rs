//! Collaborator interfaces the engine renders into.
//!
//! The host shell provides three text sinks (one per column), a progress
//! indicator and an error reporter. The engine only ever appends to the text
//! sinks; it never reads back or rewrites what it already emitted.

use std::cell::RefCell;
use std::rc::Rc;
use tracing::error;

use crate::format::{ByteText, RowText};

/// An append-only text buffer backing one column.
pub trait TextSink {
    /// Appends a fragment at the end of the buffer.
    fn append(&mut self, text: &str);

    /// Drops everything appended so far (used when a session closes).
    fn clear(&mut self);

    /// Marks the buffer as complete: the stream reached its end.
    fn complete(&mut self) {}
}

impl TextSink for String {
    fn append(&mut self, text: &str) {
        self.push_str(text);
    }

    fn clear(&mut self) {
        String::clear(self);
    }
}

impl<T: TextSink> TextSink for Rc<RefCell<T>> {
    fn append(&mut self, text: &str) {
        self.borrow_mut().append(text);
    }

    fn clear(&mut self) {
        self.borrow_mut().clear();
    }

    fn complete(&mut self) {
        self.borrow_mut().complete();
    }
}

/// A text buffer shared between the engine and whoever displays it.
pub type SharedText = Rc<RefCell<String>>;

/// The three column sinks of one document view.
pub struct ViewSinks {
    pub address: Box<dyn TextSink>,
    pub hex: Box<dyn TextSink>,
    pub ascii: Box<dyn TextSink>,
}

impl ViewSinks {
    pub fn new(
        address: Box<dyn TextSink>,
        hex: Box<dyn TextSink>,
        ascii: Box<dyn TextSink>,
    ) -> Self {
        Self { address, hex, ascii }
    }

    /// Creates sinks backed by in-memory strings, returning read handles to them.
    pub fn in_memory() -> (Self, MemoryViews) {
        let views = MemoryViews::default();
        let sinks = Self::new(
            Box::new(views.address.clone()),
            Box::new(views.hex.clone()),
            Box::new(views.ascii.clone()),
        );
        (sinks, views)
    }

    pub fn append_row(&mut self, row: &RowText) {
        self.address.append(&row.address);
        self.hex.append(&row.hex);
        self.ascii.append(&row.ascii);
    }

    pub fn append_byte(&mut self, byte: &ByteText) {
        if let Some(address) = &byte.address {
            self.address.append(address);
        }
        self.hex.append(&byte.hex);
        self.ascii.append(&byte.ascii);
    }

    pub fn clear(&mut self) {
        self.address.clear();
        self.hex.clear();
        self.ascii.clear();
    }

    pub fn complete(&mut self) {
        self.address.complete();
        self.hex.complete();
        self.ascii.complete();
    }
}

/// Read handles onto in-memory column buffers.
#[derive(Debug, Clone, Default)]
pub struct MemoryViews {
    address: SharedText,
    hex: SharedText,
    ascii: SharedText,
}

impl MemoryViews {
    pub fn address(&self) -> String {
        self.address.borrow().clone()
    }

    pub fn hex(&self) -> String {
        self.hex.borrow().clone()
    }

    pub fn ascii(&self) -> String {
        self.ascii.borrow().clone()
    }

    /// True when nothing has been rendered (or everything was cleared).
    pub fn is_empty(&self) -> bool {
        self.address.borrow().is_empty()
            && self.hex.borrow().is_empty()
            && self.ascii.borrow().is_empty()
    }

    /// Lays the three columns out side by side, one line per row.
    pub fn render_columns(&self) -> String {
        let address = self.address.borrow();
        let hex = self.hex.borrow();
        let ascii = self.ascii.borrow();
        // 16 pairs plus 15 separators
        let hex_width = 16 * 3 - 1;

        let mut out = String::new();
        let lines = address.lines().zip(hex.lines()).zip(ascii.lines());
        for ((addr, hex), chars) in lines {
            out.push_str(&format!("{addr}  {hex:<hex_width$}  {chars}\n"));
        }
        out
    }
}

/// Progress indicator shown while a source is being read.
pub trait ProgressSink {
    /// The total size is known: `fraction` is in [0, 1], `label` is a percentage.
    fn set_determinate(&mut self, fraction: f64, label: &str);

    /// The total size is unknown: signal activity without a fraction.
    fn pulse(&mut self);

    /// Reading stopped (end of stream, error, or close).
    fn finish(&mut self) {}
}

/// A progress sink that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn set_determinate(&mut self, _fraction: f64, _label: &str) {}
    fn pulse(&mut self) {}
}

/// Receives one human-readable message per failure.
pub trait ErrorReporter {
    /// Reports `message` and returns the status code the caller should propagate.
    fn report_error(&self, message: &str) -> i32;
}

/// Reports errors through the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report_error(&self, message: &str) -> i32 {
        error!("{}", message);
        1
    }
}
