//! Common test utilities and helpers.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::rc::Rc;

use hexview::plugin::PluginHelper;
use hexview::sink::{ErrorReporter, ProgressSink};
use hexview::{ByteSource, Plugin, PluginDescriptor, ReadStatus, SessionHandle, ViewHandle};
use tempfile::NamedTempFile;

/// Writes `data` to a fresh temp file.
pub fn temp_file(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(data).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// `len` bytes of printable, position-dependent data.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| b'!' + (i % 90) as u8).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Determinate(f64, String),
    Pulse,
    Finish,
}

/// Progress sink recording every call; clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress(Rc<RefCell<Vec<ProgressEvent>>>);

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.0.borrow().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn set_determinate(&mut self, fraction: f64, label: &str) {
        self.0
            .borrow_mut()
            .push(ProgressEvent::Determinate(fraction, label.to_string()));
    }

    fn pulse(&mut self) {
        self.0.borrow_mut().push(ProgressEvent::Pulse);
    }

    fn finish(&mut self) {
        self.0.borrow_mut().push(ProgressEvent::Finish);
    }
}

/// Error reporter keeping every message.
#[derive(Debug, Default)]
pub struct CollectingReporter(RefCell<Vec<String>>);

impl CollectingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report_error(&self, message: &str) -> i32 {
        self.0.borrow_mut().push(message.to_string());
        1
    }
}

/// One `on_read` call as seen by a recording plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCall {
    pub offset: u64,
    pub bytes: Option<Vec<u8>>,
}

pub type CallLog = Rc<RefCell<Vec<ReadCall>>>;

pub struct RecordingPlugin {
    view: ViewHandle,
    calls: CallLog,
}

impl Plugin for RecordingPlugin {
    fn view(&self) -> ViewHandle {
        self.view.clone()
    }

    fn on_read(&mut self, offset: u64, bytes: Option<&[u8]>) {
        self.calls.borrow_mut().push(ReadCall {
            offset,
            bytes: bytes.map(<[u8]>::to_vec),
        });
    }
}

/// Descriptor for a plugin that logs every notification into `calls`.
pub fn recording_descriptor(name: &str, calls: &CallLog) -> PluginDescriptor {
    let calls = calls.clone();
    let title = name.to_string();
    PluginDescriptor::new(name, move |_: &PluginHelper| -> Option<Box<dyn Plugin>> {
        Some(Box::new(RecordingPlugin {
            view: ViewHandle::new(title.clone()),
            calls: calls.clone(),
        }))
    })
}

/// Descriptor for a plugin that records the session size it sees on each read.
pub fn observing_descriptor(name: &str, seen: &Rc<RefCell<Vec<Option<u64>>>>) -> PluginDescriptor {
    struct Observer {
        view: ViewHandle,
        session: SessionHandle,
        seen: Rc<RefCell<Vec<Option<u64>>>>,
    }

    impl Plugin for Observer {
        fn view(&self) -> ViewHandle {
            self.view.clone()
        }

        fn on_read(&mut self, _offset: u64, _bytes: Option<&[u8]>) {
            self.seen.borrow_mut().push(self.session.total_size());
        }
    }

    let seen = seen.clone();
    PluginDescriptor::new(name, move |helper: &PluginHelper| -> Option<Box<dyn Plugin>> {
        Some(Box::new(Observer {
            view: ViewHandle::new("observer"),
            session: helper.session().clone(),
            seen: seen.clone(),
        }))
    })
}

/// One scripted read outcome.
#[derive(Debug, Clone)]
pub enum Step {
    Data(Vec<u8>),
    Empty,
    WouldBlock,
    Fail,
}

/// A source replaying a fixed script, then reporting end of stream.
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    size: Option<u64>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            size: None,
        }
    }

    /// Splits `data` into chunks of the given lengths.
    pub fn chunked(data: &[u8], lengths: &[usize]) -> Self {
        let mut steps = Vec::new();
        let mut start = 0;
        for &len in lengths {
            steps.push(Step::Data(data[start..start + len].to_vec()));
            start += len;
        }
        assert_eq!(start, data.len(), "chunk lengths must cover the data");
        Self::new(steps)
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

impl ByteSource for ScriptedSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<ReadStatus> {
        match self.steps.pop_front() {
            None => Ok(ReadStatus::Eof),
            Some(Step::Empty) => Ok(ReadStatus::Data(0)),
            Some(Step::WouldBlock) => Ok(ReadStatus::WouldBlock),
            Some(Step::Fail) => Err(io::Error::new(io::ErrorKind::Other, "scripted failure")),
            Some(Step::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.steps.push_front(Step::Data(data[n..].to_vec()));
                }
                Ok(ReadStatus::Data(n))
            }
        }
    }

    fn total_size(&self) -> Option<u64> {
        self.size
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
