use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame, FrameConfig};
use crate::error::FrameError;

/// `tokio_util` codec for the checksummed frame format.
///
/// Use with `FramedRead`/`FramedWrite` over any async byte stream.
#[derive(Debug, Clone, Default)]
pub struct StdioCodec {
    config: FrameConfig,
}

impl StdioCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl Decoder for StdioCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_frame(src, self.config.max_payload_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Frame> for StdioCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.payload.len(),
                max: self.config.max_payload_size,
            });
        }
        encode_frame(&item, dst)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::op::Op;

    #[tokio::test]
    async fn frames_cross_an_async_pipe() {
        let (client, server) = tokio::io::duplex(1024);
        let mut sink = FramedWrite::new(client, StdioCodec::new());
        let mut source = FramedRead::new(server, StdioCodec::new());

        sink.send(Frame::new(Op::Dial, 1, Bytes::from_static(b"{}")))
            .await
            .unwrap();
        sink.send(Frame::new(Op::SendToServer, 1, Bytes::from_static(b"ping")))
            .await
            .unwrap();
        drop(sink);

        let dial = source.next().await.unwrap().unwrap();
        assert_eq!(dial.op, Op::Dial);
        let data = source.next().await.unwrap().unwrap();
        assert_eq!(data.payload.as_ref(), b"ping");
        assert!(source.next().await.is_none());
    }

    #[tokio::test]
    async fn truncated_stream_is_an_error() {
        let mut wire = BytesMut::new();
        encode_frame(&Frame::new(Op::SendToClient, 2, Bytes::from_static(b"cut")), &mut wire)
            .unwrap();
        wire.truncate(wire.len() - 3);

        let mut source = FramedRead::new(&wire[..], StdioCodec::new());
        let err = source.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn encoder_honours_payload_limit() {
        let mut codec = StdioCodec::with_config(FrameConfig {
            max_payload_size: 2,
        });
        let mut dst = BytesMut::new();
        let err = codec
            .encode(Frame::new(Op::SendToServer, 1, Bytes::from_static(b"big")), &mut dst)
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }
}
