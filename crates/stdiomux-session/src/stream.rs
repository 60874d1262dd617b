use std::fmt;
use std::io::{self, Read, Write};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use stdiomux_transport::{BufferedPipe, Connection, PipeError, StdioAddr};

use crate::messages::DialArgs;
use crate::session::Inner;

/// Which side opened a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Dialed by the peer and accepted here.
    Server,
    /// Dialed from this end.
    Client,
}

impl Direction {
    pub fn name(self) -> &'static str {
        match self {
            Direction::Server => "server",
            Direction::Client => "client",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a stream, as seen by close notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamInfo {
    pub id: u16,
    pub direction: Direction,
}

impl fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.direction, self.id)
    }
}

/// Session-side state of one stream: identity plus its delivery queue.
#[derive(Debug)]
pub(crate) struct StreamCore {
    pub(crate) id: u16,
    pub(crate) direction: Direction,
    pub(crate) pipe: Arc<BufferedPipe>,
}

impl StreamCore {
    pub(crate) fn new(id: u16, direction: Direction) -> Arc<Self> {
        Arc::new(Self {
            id,
            direction,
            pipe: BufferedPipe::new(),
        })
    }

    pub(crate) fn info(&self) -> StreamInfo {
        StreamInfo {
            id: self.id,
            direction: self.direction,
        }
    }

    /// Queue inbound data for the local reader.
    pub(crate) fn deliver(&self, data: &[u8]) -> Result<(), PipeError> {
        self.pipe.write(data).map(|_| ())
    }

    /// Close both sides of the delivery queue, ignoring sides already closed.
    pub(crate) fn close_pipes(&self, reason: PipeError) {
        self.pipe.close(reason);
    }
}

/// A logical bidirectional byte stream inside a session.
///
/// Reads block until data arrives or the stream ends; a clean close by the
/// peer reads as end of file. Every write becomes exactly one data frame.
/// Handles are cheap to clone with [`try_clone`](Self::try_clone); the stream
/// is closed when the last handle is dropped.
pub struct Stream {
    handle: Arc<Handle>,
}

struct Handle {
    core: Arc<StreamCore>,
    session: Arc<Inner>,
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.close();
    }
}

impl Handle {
    fn close(&self) {
        self.session.debugf(format_args!(
            "stream.close sid={} dir={}",
            self.core.id, self.core.direction
        ));
        self.core.close_pipes(PipeError::Closed);
        self.session.close_stream(&self.core);
    }
}

impl Stream {
    pub(crate) fn new(core: Arc<StreamCore>, session: Arc<Inner>) -> Self {
        Self {
            handle: Arc::new(Handle { core, session }),
        }
    }

    pub fn id(&self) -> u16 {
        self.handle.core.id
    }

    pub fn direction(&self) -> Direction {
        self.handle.core.direction
    }

    pub fn info(&self) -> StreamInfo {
        self.handle.core.info()
    }

    /// Another handle to the same stream.
    pub fn try_clone(&self) -> io::Result<Stream> {
        Ok(Stream {
            handle: Arc::clone(&self.handle),
        })
    }

    /// Close the stream and tell the peer. Idempotent.
    ///
    /// Blocked and later reads fail; the peer sees end of stream.
    pub fn close(&self) {
        self.handle.close();
    }

    pub fn local_addr(&self) -> StdioAddr {
        StdioAddr::LOCAL
    }

    pub fn remote_addr(&self) -> StdioAddr {
        StdioAddr::REMOTE
    }

    /// Accepted and ignored; stdio pipes have no timeout primitive.
    pub fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    /// Accepted and ignored; stdio pipes have no timeout primitive.
    pub fn set_write_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn read_inner(&self, buf: &mut [u8]) -> io::Result<usize> {
        match self.handle.core.pipe.read(buf) {
            Ok(n) => Ok(n),
            Err(PipeError::Eof) => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    fn write_inner(&self, buf: &[u8]) -> io::Result<usize> {
        self.handle
            .session
            .write_to_stream(&self.handle.core, buf)
            .map_err(io::Error::from)
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.id())
            .field("direction", &self.direction())
            .field("buffered", &self.handle.core.pipe.buffered())
            .finish()
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_inner(buf)
    }
}

impl Read for &Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_inner(buf)
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_inner(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for &Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_inner(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Connection for Stream {
    fn close(&mut self) -> io::Result<()> {
        Stream::close(self);
        Ok(())
    }

    fn local_addr(&self) -> StdioAddr {
        Stream::local_addr(self)
    }

    fn remote_addr(&self) -> StdioAddr {
        Stream::remote_addr(self)
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        Stream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        Stream::set_write_timeout(self, timeout)
    }
}

/// A stream opened by the peer, together with the arguments it dialed with.
#[derive(Debug)]
pub struct DialedStream {
    stream: Stream,
    args: DialArgs,
}

impl DialedStream {
    pub(crate) fn new(stream: Stream, args: DialArgs) -> Self {
        Self { stream, args }
    }

    pub fn args(&self) -> &DialArgs {
        &self.args
    }

    pub fn into_stream(self) -> Stream {
        self.stream
    }

    pub fn into_parts(self) -> (Stream, DialArgs) {
        (self.stream, self.args)
    }
}

impl Deref for DialedStream {
    type Target = Stream;

    fn deref(&self) -> &Stream {
        &self.stream
    }
}

impl Read for DialedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for DialedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Read for &DialedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.stream).read(buf)
    }
}

impl Write for &DialedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&self.stream).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Connection for DialedStream {
    fn close(&mut self) -> io::Result<()> {
        Connection::close(&mut self.stream)
    }

    fn local_addr(&self) -> StdioAddr {
        self.stream.local_addr()
    }

    fn remote_addr(&self) -> StdioAddr {
        self.stream.remote_addr()
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_write_timeout(timeout)
    }
}
