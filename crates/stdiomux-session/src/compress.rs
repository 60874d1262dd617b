//! zstd payload compression for stream data frames.

use std::borrow::Cow;

use bytes::Bytes;
use stdiomux_frame::Frame;

use crate::error::{Result, SessionError};

#[cfg(feature = "zstd")]
const ZSTD_LEVEL: i32 = 3;

/// Whether this build can compress at all.
pub(crate) const AVAILABLE: bool = cfg!(feature = "zstd");

/// Compress `data` if that makes it smaller.
///
/// Returns the frame flags to send alongside the payload.
#[cfg(feature = "zstd")]
pub(crate) fn deflate(data: &[u8]) -> Result<(u16, Cow<'_, [u8]>)> {
    let compressed = zstd::bulk::compress(data, ZSTD_LEVEL)
        .map_err(|err| SessionError::Protocol(format!("zstd compression failed: {err}")))?;
    if compressed.len() < data.len() {
        Ok((stdiomux_frame::FLAG_ZSTD, Cow::Owned(compressed)))
    } else {
        Ok((0, Cow::Borrowed(data)))
    }
}

#[cfg(not(feature = "zstd"))]
pub(crate) fn deflate(data: &[u8]) -> Result<(u16, Cow<'_, [u8]>)> {
    Ok((0, Cow::Borrowed(data)))
}

/// Payload of `frame` as the sender wrote it.
pub(crate) fn inflate(frame: &Frame) -> Result<Bytes> {
    if !frame.is_compressed() {
        return Ok(frame.payload.clone());
    }
    decompress(&frame.payload)
}

#[cfg(feature = "zstd")]
fn decompress(data: &[u8]) -> Result<Bytes> {
    decompress_limited(data, stdiomux_frame::MAX_PAYLOAD)
}

/// Inflate `data`, failing once the output would exceed `limit` bytes.
#[cfg(feature = "zstd")]
fn decompress_limited(data: &[u8], limit: usize) -> Result<Bytes> {
    use std::io::Read;

    let failed = |err: std::io::Error| {
        SessionError::Protocol(format!("zstd decompression failed: {err}"))
    };
    let decoder = zstd::stream::read::Decoder::new(data).map_err(failed)?;
    let mut out = Vec::new();
    decoder
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .map_err(failed)?;
    if out.len() > limit {
        return Err(SessionError::Protocol(format!(
            "decompressed payload exceeds {limit} bytes"
        )));
    }
    Ok(Bytes::from(out))
}

#[cfg(not(feature = "zstd"))]
fn decompress(_data: &[u8]) -> Result<Bytes> {
    Err(SessionError::Protocol(
        "compressed frame received but zstd support is not built in".to_string(),
    ))
}
