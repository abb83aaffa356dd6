//! The document session: glues the reader, the plugins and the views.
//!
//! A [`DocumentSession`] owns the open/close lifecycle of one document. The
//! host feeds it [`Event`]s and waits for whatever [`Pending`] it returns, or
//! lets [`DocumentSession::run_to_end`] / [`DocumentSession::drive`] do the
//! waiting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::error::{HexViewError, Result};
use crate::io::{open_path, ByteSource};
use crate::plugin::registry::{PluginCatalog, PluginRegistry, PluginResolver};
use crate::plugin::PluginHelper;
use crate::reader::{Dispatch, Pending, ReaderState, StreamReader};
use crate::sink::{ErrorReporter, MemoryViews, NullProgress, ProgressSink, TracingReporter, ViewSinks};

/// Font used when none is configured.
pub const DEFAULT_FONT: &str = "Monospace";

/// Delay before retrying a source that had nothing to read.
const BLOCKED_BACKOFF: Duration = Duration::from_millis(1);

/// What is known about the open document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub path: Option<PathBuf>,
    pub source_name: Option<String>,
    pub total_size: Option<u64>,
    pub bytes_consumed: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub uppercase: bool,
    pub font: Option<String>,
    pub open: bool,
}

/// Read-only, shared view of the session state handed to plugins.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle(Rc<RefCell<SessionState>>);

impl SessionHandle {
    pub fn snapshot(&self) -> SessionState {
        self.0.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        self.0.borrow().open
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.0.borrow().path.clone()
    }

    pub fn total_size(&self) -> Option<u64> {
        self.0.borrow().total_size
    }

    pub fn bytes_consumed(&self) -> u64 {
        self.0.borrow().bytes_consumed
    }

    pub fn uppercase(&self) -> bool {
        self.0.borrow().uppercase
    }

    pub fn font(&self) -> Option<String> {
        self.0.borrow().font.clone()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.0.borrow().started_at
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut SessionState)) {
        f(&mut self.0.borrow_mut());
    }
}

/// Events the host delivers to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The source is readable.
    Readable,
    /// The event loop went idle.
    Idle,
}

/// Builder for [`DocumentSession`].
#[derive(Default)]
pub struct DocumentSessionBuilder {
    views: Option<ViewSinks>,
    progress: Option<Box<dyn ProgressSink>>,
    reporter: Option<Rc<dyn ErrorReporter>>,
    resolver: Option<Box<dyn PluginResolver>>,
    config: ViewerConfig,
}

impl DocumentSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_views(mut self, views: ViewSinks) -> Self {
        self.views = Some(views);
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressSink + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn with_reporter(mut self, reporter: Rc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Sets where plugin names are resolved; defaults to the built-in catalog.
    pub fn with_resolver(mut self, resolver: impl PluginResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn with_config(mut self, config: ViewerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<DocumentSession> {
        self.config.validate()?;
        let config = self.config;

        let handle = SessionHandle::default();
        handle.update(|s| {
            s.uppercase = config.uppercase;
            s.font = Some(config.font.clone().unwrap_or_else(|| DEFAULT_FONT.to_string()));
        });

        let reporter = self
            .reporter
            .unwrap_or_else(|| Rc::new(TracingReporter) as Rc<dyn ErrorReporter>);
        let resolver = self
            .resolver
            .unwrap_or_else(|| Box::new(PluginCatalog::builtin()));
        let helper = PluginHelper::new(handle.clone(), reporter.clone());

        let mut reader = StreamReader::new(config.chunk_size, config.progress_interval());
        reader.set_uppercase(config.uppercase);

        Ok(DocumentSession {
            reader,
            plugins: PluginRegistry::new(resolver, helper),
            views: self.views.unwrap_or_else(|| ViewSinks::in_memory().0),
            progress: self.progress.unwrap_or_else(|| Box::new(NullProgress)),
            reporter,
            handle,
            config,
            last_error: None,
        })
    }
}

/// One document being viewed.
pub struct DocumentSession {
    reader: StreamReader,
    plugins: PluginRegistry,
    views: ViewSinks,
    progress: Box<dyn ProgressSink>,
    reporter: Rc<dyn ErrorReporter>,
    handle: SessionHandle,
    config: ViewerConfig,
    last_error: Option<HexViewError>,
}

impl DocumentSession {
    pub fn builder() -> DocumentSessionBuilder {
        DocumentSessionBuilder::new()
    }

    /// Builds a session rendering into in-memory columns.
    pub fn in_memory(config: ViewerConfig) -> Result<(Self, MemoryViews)> {
        let (sinks, views) = ViewSinks::in_memory();
        let session = Self::builder().with_config(config).with_views(sinks).build()?;
        Ok((session, views))
    }

    /// Opens `path` ("-" for stdin), closing whatever was open before.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.close();
        let source = match open_path(path) {
            Ok(source) => source,
            Err(e) => {
                self.reporter.report_error(&e.to_string());
                return Err(e);
            }
        };
        self.open_source(source)?;
        self.handle.update(|s| s.path = Some(path.to_path_buf()));
        Ok(())
    }

    /// Starts reading an already opened source.
    pub fn open_source(&mut self, source: Box<dyn ByteSource>) -> Result<()> {
        self.close();
        self.last_error = None;

        let name = source.describe();
        let _span = crate::span_trace!("open_source", source = %name).entered();
        self.reader.start(source);
        let total_size = self.reader.total_size();
        self.handle.update(|s| {
            s.path = None;
            s.source_name = Some(name.clone());
            s.total_size = total_size;
            s.bytes_consumed = 0;
            s.started_at = Some(Utc::now());
            s.open = true;
        });
        if let Some(progress) = self.reader.opening_progress() {
            progress.apply(&mut *self.progress);
        }
        info!(source = %name, size = ?total_size, "Opened document");
        Ok(())
    }

    /// Closes the document. Calling it again, or without an open document, is
    /// harmless.
    pub fn close(&mut self) {
        let was_open = self.handle.is_open();
        self.reader.close();
        self.views.clear();
        if was_open {
            self.plugins.reset_all();
            self.progress.finish();
            debug!("Closed document");
        }
        self.handle.update(|s| {
            s.path = None;
            s.source_name = None;
            s.total_size = None;
            s.bytes_consumed = 0;
            s.started_at = None;
            s.open = false;
        });
    }

    /// Sets the hex digit case for everything rendered from now on.
    pub fn set_case(&mut self, uppercase: bool) {
        self.reader.set_uppercase(uppercase);
        self.config.uppercase = uppercase;
        self.handle.update(|s| s.uppercase = uppercase);
    }

    pub fn set_font(&mut self, font: impl Into<String>) {
        let font = font.into();
        self.config.font = Some(font.clone());
        self.handle.update(|s| s.font = Some(font));
    }

    /// Loads a plugin; failures are reported once and returned.
    pub fn load_plugin(&mut self, name: &str) -> Result<()> {
        self.plugins.load(name).inspect_err(|e| {
            self.reporter.report_error(&e.to_string());
        })
    }

    pub fn unload_plugin(&mut self, name: &str) {
        self.plugins.unload(name);
    }

    /// Loads every plugin listed in the configuration.
    ///
    /// All of them are attempted; the first failure is returned.
    pub fn load_configured_plugins(&mut self) -> Result<()> {
        let mut first_error = None;
        for name in self.config.plugins.clone() {
            if let Err(e) = self.load_plugin(&name) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Performs one cooperative step and returns what to wait for next.
    ///
    /// A read error is reported, kept for [`take_error`](Self::take_error),
    /// and closes the document.
    pub fn dispatch(&mut self, event: Event) -> Pending {
        let result = match event {
            Event::Readable => {
                let mut out = Dispatch {
                    views: &mut self.views,
                    plugins: &mut self.plugins,
                    progress: &mut *self.progress,
                };
                self.reader.on_readable(&mut out)
            }
            Event::Idle => Ok(self.reader.on_idle()),
        };

        let consumed = self.reader.bytes_consumed();
        self.handle.update(|s| s.bytes_consumed = consumed);

        match result {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e, "Closing document after read failure");
                self.reporter.report_error(&e.to_string());
                self.close();
                self.last_error = Some(e);
                Pending::Done
            }
        }
    }

    fn first_pending(&self) -> Pending {
        match self.reader.state() {
            ReaderState::Reading => Pending::Readable,
            ReaderState::Idling => Pending::Yield,
            _ => Pending::Done,
        }
    }

    /// Runs the document to its end on the current thread.
    pub fn run_to_end(&mut self) -> Result<()> {
        let mut pending = self.first_pending();
        loop {
            pending = match pending {
                Pending::Readable => self.dispatch(Event::Readable),
                Pending::Blocked => {
                    std::thread::sleep(BLOCKED_BACKOFF);
                    self.dispatch(Event::Readable)
                }
                Pending::Yield => self.dispatch(Event::Idle),
                Pending::Done => break,
            };
        }
        self.take_error().map_or(Ok(()), Err)
    }

    /// Runs the document to its end inside a tokio runtime, yielding to other
    /// tasks between chunks.
    pub async fn drive(&mut self) -> Result<()> {
        let mut pending = self.first_pending();
        loop {
            pending = match pending {
                Pending::Readable => self.dispatch(Event::Readable),
                Pending::Blocked => {
                    tokio::time::sleep(BLOCKED_BACKOFF).await;
                    self.dispatch(Event::Readable)
                }
                Pending::Yield => {
                    tokio::task::yield_now().await;
                    self.dispatch(Event::Idle)
                }
                Pending::Done => break,
            };
        }
        self.take_error().map_or(Ok(()), Err)
    }

    /// Takes the error that ended the last session, if any.
    pub fn take_error(&mut self) -> Option<HexViewError> {
        self.last_error.take()
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn reader_state(&self) -> ReaderState {
        self.reader.state()
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }
}
