//! Streaming hex view engine.
//!
//! A document is read chunk by chunk from a [`io::ByteSource`], rendered into
//! three append-only columns (address, hex, ascii) and forwarded verbatim to
//! observer plugins. [`session::DocumentSession`] is the entry point.

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod logging;
pub mod plugin;
pub mod reader;
pub mod session;
pub mod sink;

pub use config::ViewerConfig;
pub use error::{HexViewError, Result};
pub use format::{format_row, format_unaligned_byte, ByteText, RowText, ROW_WIDTH};
pub use io::{ByteSource, FileSource, ReadStatus, ReaderSource};
pub use plugin::registry::{PluginCatalog, PluginRegistry, PluginResolver};
pub use plugin::{Plugin, PluginDescriptor, PluginHelper, ViewHandle};
pub use reader::progress::Progress;
pub use reader::{render_chunk, Pending, ReaderState, StreamReader};
pub use session::{DocumentSession, DocumentSessionBuilder, Event, SessionHandle, SessionState};
pub use sink::{ErrorReporter, MemoryViews, ProgressSink, TextSink, ViewSinks};
