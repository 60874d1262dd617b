//! Multiplex independent byte streams over a single stdin/stdout pair.
//!
//! A host process spawns a tool, and both sides run a [`Session`](session::Session)
//! over the child's stdio. Either side can then dial any number of streams and
//! run an RPC protocol over each, as if they were sockets.
//!
//! # Crate Structure
//!
//! - [`transport`]: buffered pipes, the stdio connection adapter, and the
//!   connection/listener contracts
//! - [`frame`]: checksummed wire frames (plus a tokio codec behind `async`)
//! - [`session`]: the multiplexing session, streams, and listener

/// Re-export transport types.
pub mod transport {
    pub use stdiomux_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use stdiomux_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use stdiomux_session::*;
}
