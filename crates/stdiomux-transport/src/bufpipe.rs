//! In-memory byte pipe with independently closable read and write sides.
//!
//! Every byte channel in a session is built from a [`BufferedPipe`]: the
//! inbound and outbound halves of the underlying stdio pair, and the
//! per-stream delivery queue.
//!
//! Writes never block; the buffer grows without bound. Reads block until
//! bytes are available or a close reason has been recorded.

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use bytes::{Buf, BytesMut};

use crate::error::{PipeError, Result, TransportError};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// A condition-variable guarded byte queue.
///
/// Two close reasons are tracked separately:
/// - the *read error* is set by the producer ([`close_read`](Self::close_read))
///   and delivered to readers only once the buffer has drained;
/// - the *write error* is set by the consumer ([`close_write`](Self::close_write))
///   and delivered to writers immediately.
///
/// Once set, a close reason is never replaced.
#[derive(Debug)]
pub struct BufferedPipe {
    state: Mutex<PipeState>,
    readable: Condvar,
}

#[derive(Debug)]
struct PipeState {
    buf: BytesMut,
    read_err: Option<PipeError>,
    write_err: Option<PipeError>,
}

impl BufferedPipe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PipeState {
                buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
                read_err: None,
                write_err: None,
            }),
            readable: Condvar::new(),
        })
    }

    /// Read buffered bytes into `dst`, blocking while the pipe is empty.
    ///
    /// Returns as soon as any bytes can be copied. Once the buffer is empty
    /// and a read error was recorded, that error is returned. An empty `dst`
    /// returns `Ok(0)` without blocking.
    pub fn read(&self, dst: &mut [u8]) -> std::result::Result<usize, PipeError> {
        if dst.is_empty() {
            return Ok(0);
        }

        let mut state = self.lock();
        loop {
            if !state.buf.is_empty() {
                let n = dst.len().min(state.buf.len());
                dst[..n].copy_from_slice(&state.buf[..n]);
                state.buf.advance(n);
                return Ok(n);
            }
            if let Some(err) = &state.read_err {
                return Err(err.clone());
            }
            // The consumer side itself was closed.
            if let Some(err) = &state.write_err {
                return Err(err.clone());
            }
            state = self
                .readable
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Append `src` to the buffer and wake one blocked reader.
    ///
    /// Never blocks. Fails with the recorded write error, or with
    /// [`PipeError::Closed`] if the producer side was already closed.
    pub fn write(&self, src: &[u8]) -> std::result::Result<usize, PipeError> {
        let mut state = self.lock();
        if let Some(err) = &state.write_err {
            return Err(err.clone());
        }
        if state.read_err.is_some() {
            return Err(PipeError::Closed);
        }
        if src.is_empty() {
            return Ok(0);
        }
        state.buf.extend_from_slice(src);
        self.readable.notify_one();
        Ok(src.len())
    }

    /// Tell readers that no more data will arrive, and why.
    ///
    /// Data already buffered is still delivered before `err`.
    pub fn close_read(&self, err: PipeError) -> Result<()> {
        let mut state = self.lock();
        if state.read_err.is_some() {
            return Err(TransportError::AlreadyClosed);
        }
        state.read_err = Some(err);
        self.readable.notify_all();
        Ok(())
    }

    /// Tell writers that no more data is accepted, and why.
    ///
    /// Wakes every blocked reader, which then observe `err` once the buffer
    /// is drained.
    pub fn close_write(&self, err: PipeError) -> Result<()> {
        let mut state = self.lock();
        if state.write_err.is_some() {
            return Err(TransportError::AlreadyClosed);
        }
        state.write_err = Some(err);
        self.readable.notify_all();
        Ok(())
    }

    /// Close both sides with the same reason, ignoring sides already closed.
    pub fn close(&self, err: PipeError) {
        let _ = self.close_read(err.clone());
        let _ = self.close_write(err);
    }

    /// The reason writes are refused, if the consumer side was closed.
    pub fn write_error(&self) -> Option<PipeError> {
        self.lock().write_err.clone()
    }

    /// Number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.lock().buf.len()
    }

    fn lock(&self) -> MutexGuard<'_, PipeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a connected reader/writer pair over a fresh [`BufferedPipe`].
pub fn pipe() -> (PipeReader, PipeWriter) {
    let pipe = BufferedPipe::new();
    (PipeReader::new(Arc::clone(&pipe)), PipeWriter::new(pipe))
}

/// Reading half of a buffered pipe.
///
/// `Read` reports a clean end of stream as `Ok(0)`; any other close reason
/// becomes an `io::Error` carrying the [`PipeError`]. Dropping the reader
/// closes the write side.
#[derive(Debug)]
pub struct PipeReader {
    pipe: Arc<BufferedPipe>,
}

impl PipeReader {
    pub fn new(pipe: Arc<BufferedPipe>) -> Self {
        Self { pipe }
    }

    /// The shared pipe behind this reader.
    pub fn pipe(&self) -> &Arc<BufferedPipe> {
        &self.pipe
    }

    /// Stop accepting writes; writers observe `err`.
    pub fn close_with_error(&self, err: PipeError) -> Result<()> {
        self.pipe.close_write(err)
    }
}

impl io::Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.pipe.read(buf) {
            Ok(n) => Ok(n),
            Err(PipeError::Eof) => Ok(0),
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        let _ = self.pipe.close_write(PipeError::Closed);
    }
}

/// Writing half of a buffered pipe.
///
/// Dropping the writer signals end of stream to readers.
#[derive(Debug)]
pub struct PipeWriter {
    pipe: Arc<BufferedPipe>,
}

impl PipeWriter {
    pub fn new(pipe: Arc<BufferedPipe>) -> Self {
        Self { pipe }
    }

    /// The shared pipe behind this writer.
    pub fn pipe(&self) -> &Arc<BufferedPipe> {
        &self.pipe
    }

    /// Stop producing; readers observe `err` after draining the buffer.
    pub fn close_with_error(&self, err: PipeError) -> Result<()> {
        self.pipe.close_read(err)
    }
}

impl io::Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pipe.write(buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        let _ = self.pipe.close_read(PipeError::Eof);
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn write_then_read() {
        let pipe = BufferedPipe::new();
        assert_eq!(pipe.write(b"hello").unwrap(), 5);

        let mut buf = [0u8; 16];
        let n = pipe.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
        assert_eq!(pipe.buffered(), 0);
    }

    #[test]
    fn short_reads_drain_in_order() {
        let pipe = BufferedPipe::new();
        pipe.write(b"abcdef").unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(pipe.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(pipe.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
    }

    #[test]
    fn empty_destination_does_not_block() {
        let pipe = BufferedPipe::new();
        assert_eq!(pipe.read(&mut []).unwrap(), 0);
    }

    #[test]
    fn read_error_delivered_after_buffer_drains() {
        let pipe = BufferedPipe::new();
        pipe.write(b"tail").unwrap();
        pipe.close_read(PipeError::Eof).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(pipe.read(&mut buf).unwrap(), 4);
        assert!(matches!(pipe.read(&mut buf), Err(PipeError::Eof)));
    }

    #[test]
    fn write_error_is_immediate() {
        let pipe = BufferedPipe::new();
        pipe.close_write(PipeError::Closed).unwrap();
        assert!(matches!(pipe.write(b"x"), Err(PipeError::Closed)));
    }

    #[test]
    fn write_after_producer_closed_fails() {
        let pipe = BufferedPipe::new();
        pipe.close_read(PipeError::Eof).unwrap();
        assert!(pipe.write(b"late").is_err());
    }

    #[test]
    fn double_close_is_rejected() {
        let pipe = BufferedPipe::new();
        pipe.close_read(PipeError::Eof).unwrap();
        assert!(matches!(
            pipe.close_read(PipeError::Closed),
            Err(TransportError::AlreadyClosed)
        ));

        pipe.close_write(PipeError::Closed).unwrap();
        assert!(matches!(
            pipe.close_write(PipeError::Eof),
            Err(TransportError::AlreadyClosed)
        ));
        assert!(matches!(pipe.write_error(), Some(PipeError::Closed)));
    }

    #[test]
    fn first_close_reason_wins() {
        let pipe = BufferedPipe::new();
        pipe.close(PipeError::Closed);
        pipe.close(PipeError::Eof);

        let mut buf = [0u8; 1];
        assert!(matches!(pipe.read(&mut buf), Err(PipeError::Closed)));
    }

    #[test]
    fn blocked_reader_wakes_on_write() {
        let pipe = BufferedPipe::new();
        let reader = {
            let pipe = Arc::clone(&pipe);
            thread::spawn(move || {
                let mut buf = [0u8; 8];
                let n = pipe.read(&mut buf).unwrap();
                buf[..n].to_vec()
            })
        };

        thread::sleep(Duration::from_millis(20));
        pipe.write(b"wake").unwrap();
        assert_eq!(reader.join().unwrap(), b"wake");
    }

    #[test]
    fn close_write_wakes_all_blocked_readers() {
        let pipe = BufferedPipe::new();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let pipe = Arc::clone(&pipe);
                thread::spawn(move || {
                    let mut buf = [0u8; 8];
                    pipe.read(&mut buf)
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        pipe.close_write(PipeError::Closed).unwrap();

        for reader in readers {
            assert!(matches!(reader.join().unwrap(), Err(PipeError::Closed)));
        }
    }

    #[test]
    fn io_adapters_report_eof_as_zero() {
        let (mut reader, mut writer) = pipe();
        writer.write_all(b"done").unwrap();
        drop(writer);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"done");
    }

    #[test]
    fn dropping_reader_fails_writer() {
        let (reader, mut writer) = pipe();
        drop(reader);
        let err = writer.write(b"x").unwrap_err();
        assert!(matches!(PipeError::from_io(err), PipeError::Closed));
    }

    #[test]
    fn io_reader_surfaces_close_reason() {
        let (mut reader, writer) = pipe();
        writer
            .close_with_error(PipeError::Io(Arc::new(io::Error::other("broken"))))
            .unwrap();

        let mut buf = [0u8; 4];
        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(err.to_string(), "broken");
    }
}
