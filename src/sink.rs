//! File-backed byte sinks.
//!
//! A [`Sink`] is the output destination the writer streams into: a buffered
//! file, optionally wrapped in a gzip encoder. The writer core is generic
//! over [`std::io::Write`], so `Vec<u8>` serves as the in-memory buffer
//! sink and `Sink` as the file sink.
//!
//! The sink is acquired at construction and released exactly once: `close`
//! finalizes the stream (writing the gzip trailer when compressing) and is
//! safe to call repeatedly, and `Drop` closes on every exit path.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::Result;

/// A file-backed output sink, optionally gzip-compressed.
#[derive(Debug)]
pub struct Sink {
    inner: SinkInner,
    closed: bool,
}

#[derive(Debug)]
enum SinkInner {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Sink {
    /// Creates a sink writing to `path`.
    ///
    /// With `compressed` set, bytes are gzip-compressed on the way out and
    /// the stream is finalized with a gzip trailer on close.
    pub fn create<P: AsRef<Path>>(path: P, compressed: bool) -> Result<Self> {
        let buffered = BufWriter::new(File::create(path)?);
        let inner = if compressed {
            SinkInner::Gzip(GzEncoder::new(buffered, Compression::default()))
        } else {
            SinkInner::Plain(buffered)
        };
        Ok(Self {
            inner,
            closed: false,
        })
    }

    /// Returns true once the sink has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Flushes pending bytes and finalizes the stream.
    ///
    /// Calling `close` a second time is a no-op, never a double-finalize.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match &mut self.inner {
            SinkInner::Plain(w) => w.flush(),
            SinkInner::Gzip(enc) => {
                enc.try_finish()?;
                enc.get_mut().flush()
            }
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::other("sink is closed"));
        }
        match &mut self.inner {
            SinkInner::Plain(w) => w.write(buf),
            SinkInner::Gzip(enc) => enc.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        match &mut self.inner {
            SinkInner::Plain(w) => w.flush(),
            SinkInner::Gzip(enc) => enc.flush(),
        }
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_plain_sink_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");

        let mut sink = Sink::create(&path, false).unwrap();
        sink.write_all(b"<doc/>").unwrap();
        sink.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"<doc/>");
    }

    #[test]
    fn test_gzip_sink_produces_gzip_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml.gz");

        let mut sink = Sink::create(&path, true).unwrap();
        sink.write_all(b"<doc>hello</doc>").unwrap();
        sink.close().unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b], "missing gzip magic");

        let mut inflated = String::new();
        GzDecoder::new(&raw[..])
            .read_to_string(&mut inflated)
            .unwrap();
        assert_eq!(inflated, "<doc>hello</doc>");
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");

        let mut sink = Sink::create(&path, true).unwrap();
        sink.write_all(b"<doc/>").unwrap();
        sink.close().unwrap();
        sink.close().unwrap();
        assert!(sink.is_closed());
    }

    #[test]
    fn test_write_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");

        let mut sink = Sink::create(&path, false).unwrap();
        sink.close().unwrap();
        assert!(sink.write(b"late").is_err());
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let err = Sink::create("/nonexistent/dir/out.xml", false).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
