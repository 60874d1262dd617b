use std::fmt;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Network type reported by every stdio address.
pub const STDIO_NETWORK: &str = "stdio";

/// Synthetic address for connections that run over a pipe pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StdioAddr {
    name: &'static str,
}

impl StdioAddr {
    pub const LOCAL: StdioAddr = StdioAddr { name: "local" };
    pub const REMOTE: StdioAddr = StdioAddr { name: "remote" };
    pub const LISTENER: StdioAddr = StdioAddr { name: "listener" };

    /// Always `"stdio"`.
    pub fn network(&self) -> &'static str {
        STDIO_NETWORK
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for StdioAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A connected, bidirectional byte stream.
///
/// Mirrors the socket surface an RPC stack expects: read/write, close,
/// addresses and timeouts. Stdio-backed implementations have no OS-level
/// timeout primitive, so timeouts may be accepted and ignored.
pub trait Connection: Read + Write + Send {
    /// Close the connection.
    fn close(&mut self) -> io::Result<()>;

    /// Address of this end.
    fn local_addr(&self) -> StdioAddr;

    /// Address of the other end.
    fn remote_addr(&self) -> StdioAddr;

    /// Set the read timeout.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Set the write timeout.
    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}

/// Something that hands out incoming connections.
pub trait Listener {
    type Conn: Connection;
    type Error: std::error::Error;

    /// Block until the next connection arrives or the listener fails.
    fn accept(&self) -> Result<Self::Conn, Self::Error>;

    /// Stop listening. Pending and later `accept` calls fail.
    fn close(&self);

    /// Address this listener is bound to.
    fn local_addr(&self) -> StdioAddr;
}
