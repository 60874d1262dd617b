use std::fmt;
use std::io;

use stdiomux_session::SessionError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => USAGE,
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionAborted => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    if let SessionError::Io(source) = &err {
        let kind = source.kind();
        return io_error(context, io::Error::new(kind, err));
    }
    let code = match &err {
        SessionError::Io(_) => INTERNAL,
        SessionError::Closed
        | SessionError::ChecksumMismatch { .. }
        | SessionError::Protocol(_)
        | SessionError::Pipe(_) => TRANSPORT_ERROR,
        SessionError::PayloadTooLarge { .. } | SessionError::Encode(_) => DATA_INVALID,
        SessionError::Cancelled
        | SessionError::ListenerClosed
        | SessionError::StreamClosed
        | SessionError::Status(_) => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Map an error returned by stream I/O.
pub fn stream_error(context: &str, err: io::Error) -> CliError {
    session_error(context, SessionError::from_io(err))
}
