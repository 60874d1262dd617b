//! Checksummed wire frames for multiplexing streams over a stdio pair.
//!
//! Every frame carries:
//! - a 4-bit operation code and a 28-bit payload length (big-endian)
//! - a 16-bit stream id and 16 reserved flag bits (big-endian)
//! - the payload
//! - an xxhash64 checksum over both header words and the payload
//!
//! A checksum mismatch means the byte stream was corrupted or desynchronized;
//! decoders report it as an error instead of trying to resynchronize.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod op;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::StdioCodec;
pub use codec::{
    checksum, decode_frame, encode_frame, encode_parts, Frame, FrameConfig, CHECKSUM_SIZE,
    DEFAULT_MAX_PAYLOAD, FLAG_ZSTD, HEADER_SIZE, MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use op::Op;
pub use reader::FrameReader;
pub use writer::FrameWriter;
