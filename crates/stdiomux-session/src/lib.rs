//! Stream multiplexing over a single stdio pair.
//!
//! A [`Session`] runs on each end of a reader/writer pair (typically a child
//! process's stdin and stdout) and carries any number of independent,
//! bidirectional [`Stream`]s as checksummed frames. Either side can dial;
//! either side can accept through its [`SessionListener`], which makes a
//! session usable wherever an RPC stack expects a listener and connections.
//!
//! ```no_run
//! use std::io::{BufRead, BufReader, Write};
//! use stdiomux_session::{DialArgs, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let child = std::process::Command::new("tool")
//!     .stdin(std::process::Stdio::piped())
//!     .stdout(std::process::Stdio::piped())
//!     .spawn()?;
//! let session = Session::new(child.stdout.unwrap(), child.stdin.unwrap())?;
//!
//! let stream = session.dial(DialArgs::service("echo"))?;
//! (&stream).write_all(b"ping\n")?;
//! let mut reply = String::new();
//! BufReader::new(&stream).read_line(&mut reply)?;
//! stream.close();
//! session.shutdown();
//! # Ok(())
//! # }
//! ```

mod compress;
pub mod config;
pub mod error;
pub mod listener;
pub mod messages;
pub mod session;
pub mod stream;

pub use config::{CloseNotifier, DebugSink, SessionConfig};
pub use error::{Result, SessionError};
pub use listener::{Incoming, SessionListener};
pub use messages::{
    Code, DialArgs, HelloArgs, Status, StreamType, API_VERSION, COMPRESSION_MIN_VERSION,
    TOOL_API_VERSION,
};
pub use session::{Session, MAX_STREAM_ID};
pub use stream::{DialedStream, Direction, Stream, StreamInfo};
pub use tokio_util::sync::CancellationToken;
