//! Byte sources the stream reader consumes.
//!
//! A source is read strictly sequentially, one bounded chunk at a time. It
//! reports whether data was produced, whether it would block right now, or
//! whether the stream is exhausted.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::error::{HexViewError, Result};

/// Outcome of one read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// `n` bytes were written to the front of the buffer. `n` may be zero.
    Data(usize),
    /// Nothing is available yet; the caller should wait and try again.
    WouldBlock,
    /// The stream is exhausted.
    Eof,
}

/// A sequential, read-only byte stream.
pub trait ByteSource {
    /// Reads at most `buf.len()` bytes into `buf`.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<ReadStatus>;

    /// Total length of the stream when it is known up front.
    fn total_size(&self) -> Option<u64> {
        None
    }

    /// Human-readable name used in logs and error messages.
    fn describe(&self) -> String;
}

fn map_read(result: io::Result<usize>) -> io::Result<ReadStatus> {
    match result {
        Ok(0) => Ok(ReadStatus::Eof),
        Ok(n) => Ok(ReadStatus::Data(n)),
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
            Ok(ReadStatus::WouldBlock)
        }
        Err(e) => Err(e),
    }
}

/// A source backed by a file on disk (or a device / FIFO opened by path).
pub struct FileSource {
    path: PathBuf,
    file: File,
    size: Option<u64>,
}

impl FileSource {
    /// Opens `path` read-only.
    ///
    /// The total size is only known for regular files; devices and FIFOs are
    /// treated as streams of unknown length.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let open_err = |source| HexViewError::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        let metadata = file.metadata().map_err(open_err)?;
        let size = metadata.is_file().then(|| metadata.len());

        debug!(path = %path.display(), size = ?size, "Opened file source");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<ReadStatus> {
        let status = map_read(self.file.read(buf))?;
        trace!(path = %self.path.display(), ?status, "File read");
        Ok(status)
    }

    fn total_size(&self) -> Option<u64> {
        self.size
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A source wrapping any [`Read`] implementation (stdin, pipes, memory).
pub struct ReaderSource<R> {
    inner: R,
    name: String,
    size: Option<u64>,
}

impl<R: Read> ReaderSource<R> {
    /// Wraps a reader of unknown length.
    pub fn new(inner: R, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
            size: None,
        }
    }

    /// Wraps a reader whose total length is known.
    pub fn with_size(inner: R, name: impl Into<String>, size: u64) -> Self {
        Self {
            inner,
            name: name.into(),
            size: Some(size),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl ReaderSource<io::Cursor<Vec<u8>>> {
    /// An in-memory source of known length.
    pub fn from_bytes(data: impl Into<Vec<u8>>, name: impl Into<String>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        Self::with_size(io::Cursor::new(data), name, size)
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<ReadStatus> {
        map_read(self.inner.read(buf))
    }

    fn total_size(&self) -> Option<u64> {
        self.size
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Opens `path` as a source; `-` reads standard input.
pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Box<dyn ByteSource>> {
    let path = path.as_ref();
    if path == Path::new("-") {
        return Ok(Box::new(ReaderSource::new(io::stdin(), "<stdin>")));
    }
    Ok(Box::new(FileSource::open(path)?))
}
