use bytes::{Buf, BufMut, Bytes, BytesMut};
use xxhash_rust::xxh64::Xxh64;

use crate::error::{FrameError, Result};
use crate::op::Op;

/// Frame header: op/length word (4) + stream/reserved word (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Trailing xxhash64 checksum.
pub const CHECKSUM_SIZE: usize = 8;

/// Largest payload the 28-bit length field can describe.
pub const MAX_PAYLOAD: usize = 0x0FFF_FFFF;

/// Default maximum payload size: the full length field.
pub const DEFAULT_MAX_PAYLOAD: usize = MAX_PAYLOAD;

/// Reserved-field flag: the payload is zstd-compressed.
pub const FLAG_ZSTD: u16 = 0x1;

const LENGTH_MASK: u32 = 0x0FFF_FFFF;
const CHECKSUM_SEED: u64 = 0;

/// A decoded frame addressed to a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// What the frame asks the receiver to do.
    pub op: Op,
    /// Stream the frame belongs to; 0 for session-level frames.
    pub stream_id: u16,
    /// Low 16 bits of the second header word.
    pub flags: u16,
    /// The payload exactly as carried on the wire.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame with no flags set.
    pub fn new(op: Op, stream_id: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            op,
            stream_id,
            flags: 0,
            payload: payload.into(),
        }
    }

    /// Replace the reserved-field flags.
    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    /// Whether the payload is zstd-compressed.
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_ZSTD != 0
    }

    /// Checksum this frame carries on the wire.
    pub fn checksum(&self) -> u64 {
        let (word0, word1) = header_words(self.op, self.stream_id, self.flags, self.payload.len());
        checksum(word0, word1, &self.payload)
    }
}

/// xxhash64 over the two big-endian header words followed by the payload.
pub fn checksum(word0: u32, word1: u32, payload: &[u8]) -> u64 {
    let mut hasher = Xxh64::new(CHECKSUM_SEED);
    hasher.update(&word0.to_be_bytes());
    hasher.update(&word1.to_be_bytes());
    hasher.update(payload);
    hasher.digest()
}

fn header_words(op: Op, stream_id: u16, flags: u16, len: usize) -> (u32, u32) {
    let word0 = (u32::from(op.code()) << 28) | (len as u32 & LENGTH_MASK);
    let word1 = (u32::from(stream_id) << 16) | u32::from(flags);
    (word0, word1)
}

/// Encode a frame into the wire format.
///
/// Wire format (all words big-endian):
/// ```text
/// ┌─────────┬──────────────┬──────────────┬────────────────┬─────────┬────────────┐
/// │ Op (4b) │ Length (28b) │ Stream (16b) │ Reserved (16b) │ Payload │ xxh64 (8B) │
/// └─────────┴──────────────┴──────────────┴────────────────┴─────────┴────────────┘
/// ```
/// The checksum covers both header words and the payload.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    encode_parts(frame.op, frame.stream_id, frame.flags, &frame.payload, dst)
}

/// Encode a frame from its parts without building a [`Frame`] first.
pub fn encode_parts(
    op: Op,
    stream_id: u16,
    flags: u16,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let (word0, word1) = header_words(op, stream_id, flags, payload.len());
    dst.reserve(HEADER_SIZE + payload.len() + CHECKSUM_SIZE);
    dst.put_u32(word0);
    dst.put_u32(word1);
    dst.put_slice(payload);
    dst.put_u64(checksum(word0, word1, payload));
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. A checksum
/// mismatch is an error: the byte stream can no longer be trusted.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let word0 = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
    let word1 = u32::from_be_bytes([src[4], src[5], src[6], src[7]]);
    let payload_len = (word0 & LENGTH_MASK) as usize;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len + CHECKSUM_SIZE;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None); // Need more data
    }

    let body_end = HEADER_SIZE + payload_len;
    let expected = (&src[body_end..total]).get_u64();
    let actual = checksum(word0, word1, &src[HEADER_SIZE..body_end]);
    if expected != actual {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();
    src.advance(CHECKSUM_SIZE);

    Ok(Some(Frame {
        op: Op::from_code((word0 >> 28) as u8),
        stream_id: (word1 >> 16) as u16,
        flags: (word1 & 0xFFFF) as u16,
        payload,
    }))
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default and upper bound: [`MAX_PAYLOAD`].
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
