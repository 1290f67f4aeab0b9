use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Fixed message header: body length (4) + frame count (2) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Size of one per-frame length entry.
pub const LEN_ENTRY_SIZE: usize = 4;

/// Default maximum accepted body size: 64 MiB.
pub const DEFAULT_MAX_BODY: usize = 64 * 1024 * 1024;

/// One opaque payload within a message.
///
/// The wire layer never inspects frame content; it only measures and copies
/// it. What the bytes mean is between the two endpoint applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Bytes,
}

impl Frame {
    /// Create a frame from any byte source.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Frame length in bytes. Zero-length frames are legal.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True if the frame carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Consume the frame, returning its payload.
    pub fn into_bytes(self) -> Bytes {
        self.payload
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.payload.as_ref()
    }
}

impl From<Bytes> for Frame {
    fn from(payload: Bytes) -> Self {
        Self { payload }
    }
}

impl From<Vec<u8>> for Frame {
    fn from(payload: Vec<u8>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// The fixed six-byte prefix of every wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Total body length in bytes (sum of all per-frame lengths).
    pub body_len: u32,
    /// Number of frames in the message.
    pub frame_count: u16,
}

impl Header {
    /// Parse a header from its wire bytes.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        let body_len = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let frame_count = u16::from_le_bytes(bytes[4..6].try_into().unwrap());
        Self {
            body_len,
            frame_count,
        }
    }

    /// Append the wire encoding of this header.
    pub fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.body_len);
        dst.put_u16_le(self.frame_count);
    }

    /// True for the reserved `(0, 0)` close sentinel.
    pub fn is_close(&self) -> bool {
        self.body_len == 0 && self.frame_count == 0
    }
}

/// Encode an ordered frame sequence into its wire representation.
///
/// Deterministic: the header, then one length entry per frame, then the
/// frame bytes concatenated in input order with no padding. An empty
/// sequence produces exactly the six-byte close sentinel.
pub fn encode_message(frames: &[Frame], dst: &mut BytesMut) -> Result<()> {
    if frames.is_empty() {
        encode_close(dst);
        return Ok(());
    }

    if frames.len() > u16::MAX as usize {
        return Err(WireError::TooManyFrames {
            count: frames.len(),
            max: u16::MAX as usize,
        });
    }

    let mut total: u64 = 0;
    for frame in frames {
        if frame.len() > u32::MAX as usize {
            return Err(WireError::FrameTooLarge {
                size: frame.len(),
                max: u32::MAX as usize,
            });
        }
        total += frame.len() as u64;
    }
    if total > u64::from(u32::MAX) {
        return Err(WireError::BodyTooLarge {
            size: total,
            max: u32::MAX as usize,
        });
    }

    let header = Header {
        body_len: total as u32,
        frame_count: frames.len() as u16,
    };
    dst.reserve(HEADER_SIZE + frames.len() * LEN_ENTRY_SIZE + total as usize);
    header.put(dst);
    for frame in frames {
        dst.put_u32_le(frame.len() as u32);
    }
    for frame in frames {
        dst.put_slice(frame.as_ref());
    }
    Ok(())
}

/// Append the six-byte close sentinel.
///
/// The sentinel is the only legal zero-frame message; receivers treat it as
/// an orderly end of session.
pub fn encode_close(dst: &mut BytesMut) {
    Header {
        body_len: 0,
        frame_count: 0,
    }
    .put(dst);
}

/// Parse a per-frame length list from its wire bytes (4 bytes per entry).
pub fn parse_length_list(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(LEN_ENTRY_SIZE)
        .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

/// Check the recorded per-frame lengths against the header's body length.
///
/// A mismatch means the framing itself is corrupt; the stream cannot be
/// resynchronized and the connection must be torn down.
pub fn validate_lengths(header: Header, lens: &[u32]) -> Result<()> {
    let sum: u64 = lens.iter().map(|&len| u64::from(len)).sum();
    if sum != u64::from(header.body_len) {
        return Err(WireError::LengthMismatch {
            declared: header.body_len,
            sum,
        });
    }
    Ok(())
}

/// Split a message body into frames along the recorded lengths.
///
/// The lengths must already be validated against the body; the split is
/// zero-copy slicing of the shared body buffer, preserving order.
pub fn split_frames(mut body: Bytes, lens: &[u32]) -> Vec<Frame> {
    let mut frames = Vec::with_capacity(lens.len());
    for &len in lens {
        frames.push(Frame::from(body.split_to(len as usize)));
    }
    frames
}

/// Configuration for message I/O over a connection.
#[derive(Debug, Clone)]
pub struct WireConfig {
    /// Maximum accepted body size in bytes. Default: 64 MiB.
    pub max_body_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_six_zero_bytes() {
        let mut buf = BytesMut::new();
        encode_message(&[], &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0u8; HEADER_SIZE]);

        let mut close = BytesMut::new();
        encode_close(&mut close);
        assert_eq!(buf, close);
    }

    #[test]
    fn header_roundtrip() {
        let header = Header {
            body_len: 0x01020304,
            frame_count: 0x0506,
        };
        let mut buf = BytesMut::new();
        header.put(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);

        let mut arr = [0u8; HEADER_SIZE];
        arr.copy_from_slice(&buf);
        assert_eq!(Header::parse(&arr), header);
    }

    #[test]
    fn encode_layout_is_exact() {
        let frames = [
            Frame::new(b"ab".as_ref()),
            Frame::new(Bytes::new()),
            Frame::new(b"xyz".as_ref()),
        ];
        let mut buf = BytesMut::new();
        encode_message(&frames, &mut buf).unwrap();

        #[rustfmt::skip]
        let expected: &[u8] = &[
            5, 0, 0, 0,         // body length
            3, 0,               // frame count
            2, 0, 0, 0,         // len("ab")
            0, 0, 0, 0,         // len("")
            3, 0, 0, 0,         // len("xyz")
            b'a', b'b', b'x', b'y', b'z',
        ];
        assert_eq!(buf.as_ref(), expected);
    }

    #[test]
    fn sentinel_differs_from_empty_frame_message() {
        // One zero-length frame is a real message, not the sentinel.
        let mut buf = BytesMut::new();
        encode_message(&[Frame::new(Bytes::new())], &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + LEN_ENTRY_SIZE);

        let mut arr = [0u8; HEADER_SIZE];
        arr.copy_from_slice(&buf[..HEADER_SIZE]);
        assert!(!Header::parse(&arr).is_close());
    }

    #[test]
    fn length_sum_mismatch_detected() {
        let header = Header {
            body_len: 10,
            frame_count: 2,
        };
        let err = validate_lengths(header, &[3, 4]).unwrap_err();
        assert!(matches!(
            err,
            WireError::LengthMismatch {
                declared: 10,
                sum: 7
            }
        ));
    }

    #[test]
    fn missing_length_list_fails_validation() {
        // Declared body bytes with a zero frame count cannot be consistent.
        let header = Header {
            body_len: 5,
            frame_count: 0,
        };
        assert!(matches!(
            validate_lengths(header, &[]),
            Err(WireError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn split_preserves_order_and_content() {
        let body = Bytes::from_static(b"abxyz");
        let frames = split_frames(body, &[2, 0, 3]);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].as_ref(), b"ab");
        assert!(frames[1].is_empty());
        assert_eq!(frames[2].as_ref(), b"xyz");
    }

    #[test]
    fn too_many_frames_rejected() {
        let frames = vec![Frame::new(Bytes::new()); u16::MAX as usize + 1];
        let mut buf = BytesMut::new();
        let err = encode_message(&frames, &mut buf).unwrap_err();
        assert!(matches!(err, WireError::TooManyFrames { .. }));
    }

    #[test]
    fn parse_length_list_little_endian() {
        let bytes = [1, 0, 0, 0, 0, 1, 0, 0];
        assert_eq!(parse_length_list(&bytes), vec![1, 256]);
    }
}
