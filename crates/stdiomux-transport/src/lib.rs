//! Byte-pipe building blocks for stdio transports.
//!
//! Provides the lowest layer of stdiomux:
//! - [`BufferedPipe`], an in-memory blocking byte queue whose read and write
//!   sides can be closed independently
//! - [`StdioConnection`], a single unmultiplexed connection over a
//!   writer/reader pair
//! - the [`Connection`] and [`Listener`] contracts that sessions and streams
//!   satisfy so RPC stacks can run over them
//!
//! Everything else builds on the types provided here.

pub mod bufpipe;
pub mod connection;
pub mod error;
pub mod traits;

pub use bufpipe::{pipe, BufferedPipe, PipeReader, PipeWriter};
pub use connection::StdioConnection;
pub use error::{PipeError, Result, TransportError};
pub use traits::{Connection, Listener, StdioAddr, STDIO_NETWORK};
