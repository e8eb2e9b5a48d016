//! `tokio_util` codec for driving an `AsyncRead` capture through `FramedRead`.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::{decode_frame, Frame, FrameConfig};
use crate::error::FrameError;

/// Outer frame decoder for use with `tokio_util::codec::FramedRead`.
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    config: FrameConfig,
}

impl FrameCodec {
    /// Create a codec with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_frame(src, self.config.max_payload_size)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use tokio_util::codec::FramedRead;

    use super::*;
    use crate::codec::encode_frame;
    use crate::frame_type::FrameType;

    #[tokio::test]
    async fn framed_read_yields_frames_in_order() {
        let mut wire = BytesMut::new();
        encode_frame(FrameType::Regular, 1, 0, b"first", &mut wire).unwrap();
        encode_frame(FrameType::KeepAlive, 0, 1, b"", &mut wire).unwrap();
        let bytes = wire.to_vec();

        let mut framed = FramedRead::new(bytes.as_slice(), FrameCodec::default());

        let first = framed.next().await.unwrap().unwrap();
        assert_eq!(first.frame_type, FrameType::Regular);
        assert_eq!(first.payload.as_ref(), b"first");

        let second = framed.next().await.unwrap().unwrap();
        assert_eq!(second.frame_type, FrameType::KeepAlive);

        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_read_reports_oversized_frame() {
        let mut wire = BytesMut::new();
        encode_frame(FrameType::Regular, 1, 0, &[0u8; 64], &mut wire).unwrap();
        let bytes = wire.to_vec();

        let codec = FrameCodec::with_config(FrameConfig {
            max_payload_size: 8,
        });
        let mut framed = FramedRead::new(bytes.as_slice(), codec);

        let err = framed.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 64, max: 8 }));
    }
}
