use std::io::{self, Read, Write};
use std::time::Duration;

use tracing::trace;

use crate::traits::{Connection, StdioAddr};

/// A single, unmultiplexed connection over a writer/reader pair.
///
/// Reads and writes pass straight through. Closing is a no-op because the
/// caller owns the lifecycle of the underlying pipes, and timeouts are
/// accepted but ignored.
pub struct StdioConnection<W, R> {
    writer: W,
    reader: R,
}

impl<W: Write, R: Read> StdioConnection<W, R> {
    pub fn new(writer: W, reader: R) -> Self {
        Self { writer, reader }
    }

    /// Consume the connection and return `(writer, reader)`.
    pub fn into_inner(self) -> (W, R) {
        (self.writer, self.reader)
    }
}

impl StdioConnection<io::Stdout, io::Stdin> {
    /// Connection over this process's stdout (write) and stdin (read).
    pub fn from_process() -> Self {
        Self::new(io::stdout(), io::stdin())
    }
}

impl<W, R: Read> Read for StdioConnection<W, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<W: Write, R> Write for StdioConnection<W, R> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl<W, R> Connection for StdioConnection<W, R>
where
    W: Write + Send,
    R: Read + Send,
{
    fn close(&mut self) -> io::Result<()> {
        trace!("stdio connection close (no-op)");
        Ok(())
    }

    fn local_addr(&self) -> StdioAddr {
        StdioAddr::LOCAL
    }

    fn remote_addr(&self) -> StdioAddr {
        StdioAddr::REMOTE
    }

    fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn set_write_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

impl<W, R> std::fmt::Debug for StdioConnection<W, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioConnection")
            .field("network", &crate::traits::STDIO_NETWORK)
            .finish()
    }
}
