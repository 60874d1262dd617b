use std::io;
use std::sync::Arc;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The pipe side was already closed; the first close reason wins.
    #[error("already closed")]
    AlreadyClosed,

    /// An I/O error occurred on the underlying reader or writer.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Reason a buffered pipe side was closed.
///
/// Cloned out to every blocked or later reader/writer, so I/O errors are
/// held behind an `Arc`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipeError {
    /// The producing side finished cleanly.
    #[error("end of stream")]
    Eof,

    /// The pipe was closed locally.
    #[error("closed")]
    Closed,

    /// The underlying reader or writer failed.
    #[error("{0}")]
    Io(Arc<io::Error>),

    /// Any other close reason, typically a higher layer's error type.
    #[error("{0}")]
    Other(Arc<dyn std::error::Error + Send + Sync>),
}

impl PipeError {
    /// Wrap an arbitrary error as a close reason.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PipeError::Other(Arc::new(err))
    }

    /// Recover the close reason carried by an `io::Error` produced by a pipe.
    ///
    /// Errors that did not originate in a pipe are wrapped as [`PipeError::Io`].
    pub fn from_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof && err.get_ref().is_none() {
            return PipeError::Eof;
        }
        if let Some(inner) = err.get_ref().and_then(|e| e.downcast_ref::<PipeError>()) {
            return inner.clone();
        }
        PipeError::Io(Arc::new(err))
    }

    /// `io::ErrorKind` this reason maps to when surfaced through `std::io`.
    pub fn io_kind(&self) -> io::ErrorKind {
        match self {
            PipeError::Eof => io::ErrorKind::UnexpectedEof,
            PipeError::Closed => io::ErrorKind::ConnectionAborted,
            PipeError::Io(err) => err.kind(),
            PipeError::Other(_) => io::ErrorKind::BrokenPipe,
        }
    }
}

impl From<io::Error> for PipeError {
    fn from(err: io::Error) -> Self {
        PipeError::from_io(err)
    }
}

impl From<PipeError> for io::Error {
    fn from(err: PipeError) -> Self {
        io::Error::new(err.io_kind(), err)
    }
}
