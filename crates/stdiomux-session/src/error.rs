use std::io;
use std::sync::Arc;

use stdiomux_frame::FrameError;
use stdiomux_transport::PipeError;

use crate::messages::Status;

/// Errors that can occur in session and stream operations.
///
/// The first fatal error is recorded as the session's terminal error and
/// handed to every later caller, so this type is `Clone`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The peer closed the underlying connection.
    #[error("connection closed by peer")]
    Closed,

    /// The underlying reader or writer failed.
    #[error("session I/O error: {0}")]
    Io(Arc<io::Error>),

    /// A frame failed checksum verification.
    #[error("bad checksum (expected {expected:#018x}, got {actual:#018x})")]
    ChecksumMismatch { expected: u64, actual: u64 },

    /// The peer sent something that cannot be processed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The session's cancellation token fired.
    #[error("session cancelled")]
    Cancelled,

    /// The session was shut down locally.
    #[error("listener closed")]
    ListenerClosed,

    /// The stream was closed, locally or by the peer.
    #[error("stream closed")]
    StreamClosed,

    /// The peer reported an error for this stream.
    #[error("{0}")]
    Status(Status),

    /// A single write exceeds what one frame can carry.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A control payload could not be encoded.
    #[error("encode error: {0}")]
    Encode(Arc<serde_json::Error>),

    /// A pipe was closed for a reason that is not a session error.
    #[error("{0}")]
    Pipe(PipeError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

impl SessionError {
    /// Recover a session error from a pipe close reason.
    ///
    /// Terminal errors are stored in pipes as [`PipeError::Other`], so they
    /// come back out unchanged.
    pub fn from_pipe(err: PipeError) -> Self {
        match err {
            PipeError::Eof => SessionError::Closed,
            PipeError::Io(err) => SessionError::Io(err),
            PipeError::Other(inner) => match inner.downcast_ref::<SessionError>() {
                Some(err) => err.clone(),
                None => SessionError::Pipe(PipeError::Other(inner)),
            },
            other => SessionError::Pipe(other),
        }
    }

    /// Recover a session error from an `io::Error` returned by a stream.
    pub fn from_io(err: io::Error) -> Self {
        if let Some(inner) = err.get_ref().and_then(|e| e.downcast_ref::<SessionError>()) {
            return inner.clone();
        }
        Self::from_pipe(PipeError::from_io(err))
    }

    /// Whether the peer went away cleanly rather than failing.
    pub fn is_closed(&self) -> bool {
        matches!(self, SessionError::Closed | SessionError::ListenerClosed)
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            SessionError::Closed => io::ErrorKind::UnexpectedEof,
            SessionError::Io(err) => err.kind(),
            SessionError::ChecksumMismatch { .. } | SessionError::Protocol(_) => {
                io::ErrorKind::InvalidData
            }
            SessionError::ListenerClosed => io::ErrorKind::NotConnected,
            SessionError::StreamClosed => io::ErrorKind::BrokenPipe,
            SessionError::PayloadTooLarge { .. } | SessionError::Encode(_) => {
                io::ErrorKind::InvalidInput
            }
            SessionError::Pipe(err) => err.io_kind(),
            SessionError::Cancelled | SessionError::Status(_) => io::ErrorKind::Other,
        }
    }
}

impl From<FrameError> for SessionError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::ConnectionClosed => SessionError::Closed,
            FrameError::ChecksumMismatch { expected, actual } => {
                SessionError::ChecksumMismatch { expected, actual }
            }
            FrameError::PayloadTooLarge { size, max } => SessionError::PayloadTooLarge { size, max },
            FrameError::Io(err) => SessionError::from_pipe(PipeError::from_io(err)),
        }
    }
}

impl From<PipeError> for SessionError {
    fn from(err: PipeError) -> Self {
        SessionError::from_pipe(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Encode(Arc::new(err))
    }
}

impl From<SessionError> for PipeError {
    fn from(err: SessionError) -> Self {
        PipeError::other(err)
    }
}

impl From<SessionError> for io::Error {
    fn from(err: SessionError) -> Self {
        io::Error::new(err.io_kind(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Code;

    #[test]
    fn terminal_error_survives_a_pipe() {
        let reason: PipeError = SessionError::Cancelled.into();
        let io_err: io::Error = reason.into();
        assert!(matches!(SessionError::from_io(io_err), SessionError::Cancelled));
    }

    #[test]
    fn status_survives_io_conversion() {
        let status = Status::new(Code::NotFound, "no such stream");
        let io_err: io::Error = SessionError::Status(status.clone()).into();
        match SessionError::from_io(io_err) {
            SessionError::Status(got) => assert_eq!(got, status),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn frame_errors_map_across() {
        assert!(matches!(
            SessionError::from(FrameError::ConnectionClosed),
            SessionError::Closed
        ));
        assert!(matches!(
            SessionError::from(FrameError::ChecksumMismatch {
                expected: 1,
                actual: 2
            }),
            SessionError::ChecksumMismatch {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn eof_reason_means_closed() {
        assert!(SessionError::from_pipe(PipeError::Eof).is_closed());
        assert!(!SessionError::from_pipe(PipeError::Closed).is_closed());
    }

    #[test]
    fn io_kinds() {
        let err: io::Error = SessionError::StreamClosed.into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        let err: io::Error = SessionError::PayloadTooLarge { size: 2, max: 1 }.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
