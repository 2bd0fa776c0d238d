//! Newline-delimited framing.
//!
//! One frame is every byte up to the next `\n`. The codec never looks inside
//! a frame; whether the bytes are JSON or base64 is decided one layer up.

use crate::config::MAX_FRAME_LENGTH;
use crate::error::{constants, ProtocolError};
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

pub const FRAME_DELIMITER: u8 = b'\n';

#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_length: usize,
    /// Bytes already scanned for a delimiter, so partial reads are not rescanned.
    scanned: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_LENGTH)
    }
}

impl FrameCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            scanned: 0,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let start = self.scanned.min(src.len());
        match src[start..].iter().position(|b| *b == FRAME_DELIMITER) {
            Some(offset) => {
                let end = start + offset;
                if end > self.max_length {
                    return Err(ProtocolError::FramingError(format!(
                        "{}: {end} > {}",
                        constants::ERR_FRAME_TOO_LONG,
                        self.max_length
                    )));
                }
                self.scanned = 0;
                let mut frame = src.split_to(end + 1);
                frame.truncate(end);
                Ok(Some(frame))
            }
            None => {
                if src.len() > self.max_length {
                    return Err(ProtocolError::FramingError(format!(
                        "{}: {} > {}",
                        constants::ERR_FRAME_TOO_LONG,
                        src.len(),
                        self.max_length
                    )));
                }
                self.scanned = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(ProtocolError::FramingError(format!(
                "{} ({} bytes pending)",
                constants::ERR_TRUNCATED_FRAME,
                src.len()
            ))),
        }
    }
}

impl<T: AsRef<[u8]>> Encoder<T> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, payload: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = payload.as_ref();
        if payload.contains(&FRAME_DELIMITER) {
            return Err(ProtocolError::FramingError(
                "payload contains the frame delimiter".into(),
            ));
        }
        if payload.len() > self.max_length {
            return Err(ProtocolError::FramingError(format!(
                "{}: {} > {}",
                constants::ERR_FRAME_TOO_LONG,
                payload.len(),
                self.max_length
            )));
        }
        dst.reserve(payload.len() + 1);
        dst.put_slice(payload);
        dst.put_u8(FRAME_DELIMITER);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_appends_delimiter() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        codec.encode(b"{\"type\":\"login\"}", &mut buf).unwrap();
        assert_eq!(&buf[..], b"{\"type\":\"login\"}\n");
    }

    #[test]
    fn test_decode_across_partial_reads() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"abc"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"def\nghi\n");
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], b"abcdef");
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], b"ghi");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_empty_frame() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"\n"[..]);
        assert!(codec.decode(&mut buf).unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_eof_mid_frame_is_framing_error() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"half a fra"[..]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(ProtocolError::FramingError(_))
        ));

        let mut empty = BytesMut::new();
        assert!(codec.decode_eof(&mut empty).unwrap().is_none());
    }

    #[test]
    fn test_oversized_frames_rejected() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::from(&b"0123456789"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::FramingError(_))
        ));

        let mut out = BytesMut::new();
        assert!(codec.encode(b"0123456789", &mut out).is_err());
        assert!(codec.encode(b"a\nb", &mut out).is_err());
    }
}
