use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocol revision spoken by this crate.
pub const API_VERSION: u32 = 1;
/// Default tool API version advertised in `hello`.
pub const TOOL_API_VERSION: u32 = 2;
/// Lowest tool API version on both ends for payload compression to be used.
pub const COMPRESSION_MIN_VERSION: u32 = 2;

/// `hello` payload, sent once by each side when the session starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelloArgs {
    pub api_version: u32,
    pub tool_api_version: u32,
}

impl HelloArgs {
    pub fn new(tool_api_version: u32) -> Self {
        Self {
            api_version: API_VERSION,
            tool_api_version,
        }
    }

    /// Whether this side can receive compressed payloads.
    pub fn supports_compression(&self) -> bool {
        self.tool_api_version >= COMPRESSION_MIN_VERSION
    }
}

/// What the dialed stream will carry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    #[default]
    Unspecified,
    Grpc,
}

/// `dial` payload describing the stream being opened.
///
/// `DialArgs::default()` opens an untyped stream with no service name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DialArgs {
    #[serde(default)]
    pub stream_type: StreamType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_name: String,
}

impl DialArgs {
    /// Dial a gRPC stream.
    pub fn grpc() -> Self {
        Self {
            stream_type: StreamType::Grpc,
            service_name: String::new(),
        }
    }

    /// Dial a named service.
    pub fn service(name: impl Into<String>) -> Self {
        Self {
            stream_type: StreamType::Unspecified,
            service_name: name.into(),
        }
    }
}

/// Status codes carried by error frames. Numbering follows gRPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum Code {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl Code {
    pub fn name(self) -> &'static str {
        match self {
            Code::Ok => "ok",
            Code::Cancelled => "cancelled",
            Code::Unknown => "unknown",
            Code::InvalidArgument => "invalid argument",
            Code::DeadlineExceeded => "deadline exceeded",
            Code::NotFound => "not found",
            Code::AlreadyExists => "already exists",
            Code::PermissionDenied => "permission denied",
            Code::ResourceExhausted => "resource exhausted",
            Code::FailedPrecondition => "failed precondition",
            Code::Aborted => "aborted",
            Code::OutOfRange => "out of range",
            Code::Unimplemented => "unimplemented",
            Code::Internal => "internal",
            Code::Unavailable => "unavailable",
            Code::DataLoss => "data loss",
            Code::Unauthenticated => "unauthenticated",
        }
    }
}

impl From<Code> for u32 {
    fn from(code: Code) -> Self {
        code as u32
    }
}

impl TryFrom<u32> for Code {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Code::Ok,
            1 => Code::Cancelled,
            2 => Code::Unknown,
            3 => Code::InvalidArgument,
            4 => Code::DeadlineExceeded,
            5 => Code::NotFound,
            6 => Code::AlreadyExists,
            7 => Code::PermissionDenied,
            8 => Code::ResourceExhausted,
            9 => Code::FailedPrecondition,
            10 => Code::Aborted,
            11 => Code::OutOfRange,
            12 => Code::Unimplemented,
            13 => Code::Internal,
            14 => Code::Unavailable,
            15 => Code::DataLoss,
            16 => Code::Unauthenticated,
            other => return Err(format!("unknown status code {other}")),
        };
        Ok(code)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error status carried by `server-error` and `client-error` frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Status {
    pub code: Code,
    #[serde(default)]
    pub message: String,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Decode an error frame payload.
    ///
    /// A payload that does not decode becomes an internal "unknown error".
    pub fn decode(payload: &[u8]) -> Self {
        serde_json::from_slice(payload)
            .unwrap_or_else(|_| Status::new(Code::Internal, "unknown error"))
    }

    pub fn encode(&self) -> Vec<u8> {
        // Serializing a struct of a string and an integer cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }
}
