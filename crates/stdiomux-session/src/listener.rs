use stdiomux_transport::{Listener, StdioAddr};

use crate::error::{Result, SessionError};
use crate::session::Session;
use crate::stream::DialedStream;

/// Accepts the streams a session's peer dials.
///
/// Closing the listener shuts the whole session down.
#[derive(Debug, Clone)]
pub struct SessionListener {
    session: Session,
}

impl SessionListener {
    pub(crate) fn new(session: Session) -> Self {
        Self { session }
    }

    /// Block until the peer dials the next stream.
    pub fn accept(&self) -> Result<DialedStream> {
        self.session.accept()
    }

    /// Shut the session down.
    pub fn close(&self) {
        self.session.shutdown();
    }

    pub fn local_addr(&self) -> StdioAddr {
        StdioAddr::LISTENER
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Iterate over accepted streams.
    ///
    /// Yields the session's terminal error once, then ends.
    pub fn incoming(&self) -> Incoming<'_> {
        Incoming {
            listener: self,
            done: false,
        }
    }
}

impl Listener for SessionListener {
    type Conn = DialedStream;
    type Error = SessionError;

    fn accept(&self) -> Result<DialedStream> {
        SessionListener::accept(self)
    }

    fn close(&self) {
        SessionListener::close(self);
    }

    fn local_addr(&self) -> StdioAddr {
        SessionListener::local_addr(self)
    }
}

/// Iterator returned by [`SessionListener::incoming`].
#[derive(Debug)]
pub struct Incoming<'a> {
    listener: &'a SessionListener,
    done: bool,
}

impl Iterator for Incoming<'_> {
    type Item = Result<DialedStream>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.listener.accept();
        self.done = next.is_err();
        Some(next)
    }
}
