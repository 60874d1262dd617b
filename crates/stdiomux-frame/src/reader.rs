use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{decode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete, checksum-verified frames from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached and
    /// `Err(FrameError::ChecksumMismatch)` when the stream is corrupted.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, self.config.max_payload_size)? {
                trace!(
                    op = %frame.op,
                    stream_id = frame.stream_id,
                    size = frame.payload.len(),
                    "decoded frame"
                );
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, Bytes, BytesMut};

    use super::*;
    use crate::codec::{encode_frame, encode_parts};
    use crate::op::Op;

    fn wire(frames: &[Frame]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for frame in frames {
            encode_frame(frame, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let bytes = wire(&[Frame::new(Op::SendToServer, 1, Bytes::from_static(b"hello"))]);
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.op, Op::SendToServer);
        assert_eq!(frame.stream_id, 1);
        assert_eq!(frame.payload.as_ref(), b"hello");
    }

    #[test]
    fn read_multiple_frames_in_order() {
        let bytes = wire(&[
            Frame::new(Op::Dial, 1, Bytes::from_static(b"one")),
            Frame::new(Op::SendToServer, 1, Bytes::from_static(b"two")),
            Frame::new(Op::CloseClientSide, 1, Bytes::new()),
        ]);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        assert_eq!(reader.read_frame().unwrap().op, Op::Dial);
        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), b"two");
        assert_eq!(reader.read_frame().unwrap().op, Op::CloseClientSide);
    }

    #[test]
    fn read_frame_with_large_payload() {
        let payload = vec![0xAB; 64 * 1024];
        let mut buf = BytesMut::new();
        encode_parts(Op::SendToClient, 9, 0, &payload, &mut buf).unwrap();

        let mut reader = FrameReader::new(Cursor::new(buf.to_vec()));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.stream_id, 9);
        assert_eq!(frame.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let bytes = wire(&[Frame::new(Op::SendToServer, 4, Bytes::from_static(b"slow"))]);
        let mut reader = FrameReader::new(ByteByByteReader { bytes, pos: 0 });

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.stream_id, 4);
        assert_eq!(frame.payload.as_ref(), b"slow");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut partial = BytesMut::new();
        partial.put_u32(0x3000_0010);
        partial.put_u32(0x0002_0000);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn corrupted_payload_in_stream() {
        let mut bytes = wire(&[Frame::new(Op::SendToServer, 2, Bytes::from_static(b"intact"))]);
        bytes[10] ^= 0x40;

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ChecksumMismatch { .. }));
    }

    #[test]
    fn oversized_frame_in_stream() {
        let mut buf = BytesMut::new();
        buf.put_u32(0x3000_0400);
        buf.put_u32(0x0001_0000);

        let cfg = FrameConfig {
            max_payload_size: 16,
        };
        let mut reader = FrameReader::with_config(Cursor::new(buf.to_vec()), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn interrupted_read_retries() {
        let bytes = wire(&[Frame::new(Op::SendToClient, 8, Bytes::from_static(b"ok"))]);
        let mut framed = FrameReader::new(InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(bytes),
        });
        let frame = framed.read_frame().unwrap();

        assert_eq!(frame.stream_id, 8);
        assert_eq!(frame.payload.as_ref(), b"ok");
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        assert_eq!(reader.config().max_payload_size, crate::MAX_PAYLOAD);
        let _inner = reader.into_inner();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
