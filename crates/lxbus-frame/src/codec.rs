use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::checksum::Checksum;
use crate::error::{FrameError, Result};

/// Value of both header bytes.
pub const HEADER_BYTE: u8 = 0x55;

/// Frame header.
pub const HEADER: [u8; 2] = [HEADER_BYTE, HEADER_BYTE];

/// Id addressing every servo on the bus. When parsing a reply it accepts any id.
pub const BROADCAST_ID: u8 = 0xFE;

/// Maximum number of parameter bytes in one frame.
pub const MAX_PARAMS: usize = 4;

/// Smallest valid length byte (no params).
pub const MIN_LENGTH: u8 = 3;

/// Largest valid length byte (four params).
pub const MAX_LENGTH: u8 = MIN_LENGTH + MAX_PARAMS as u8;

/// Header (2) + id + length + command + checksum.
pub const FRAME_OVERHEAD: usize = 6;

/// Wire size of a frame carrying [`MAX_PARAMS`] parameters.
pub const MAX_FRAME_LEN: usize = FRAME_OVERHEAD + MAX_PARAMS;

pub(crate) const LENGTH_POS: usize = 3;

/// A servo bus frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Servo id, or [`BROADCAST_ID`].
    pub id: u8,
    /// Command id.
    pub command: u8,
    /// Zero to four parameter bytes.
    pub params: Bytes,
}

impl Frame {
    /// Create a new frame. Fails if `params` holds more than [`MAX_PARAMS`] bytes.
    pub fn new(id: u8, command: u8, params: impl Into<Bytes>) -> Result<Self> {
        let params = params.into();
        check_param_count(params.len())?;
        Ok(Self {
            id,
            command,
            params,
        })
    }

    /// The length byte carried on the wire.
    pub fn length_byte(&self) -> u8 {
        MIN_LENGTH + self.params.len() as u8
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        FRAME_OVERHEAD + self.params.len()
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        encode_frame(self.command, &self.params, self.id, &mut buf)?;
        Ok(buf.freeze())
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────┬────┬────────┬─────────┬──────────┬──────────┐
/// │ 0x55 0x55 │ id │ length │ command │ params   │ checksum │
/// │           │    │ 3 + n  │         │ n = 0..4 │          │
/// └───────────┴────┴────────┴─────────┴──────────┴──────────┘
/// ```
/// `checksum = !(id + length + command + params) as u8`.
pub fn encode_frame(command: u8, params: &[u8], id: u8, dst: &mut BytesMut) -> Result<()> {
    check_param_count(params.len())?;

    let length = MIN_LENGTH + params.len() as u8;
    let mut sum = Checksum::new();
    sum.extend(&[id, length, command]);
    sum.extend(params);

    dst.reserve(FRAME_OVERHEAD + params.len());
    dst.put_slice(&HEADER);
    dst.put_u8(id);
    dst.put_u8(length);
    dst.put_u8(command);
    dst.put_slice(params);
    dst.put_u8(sum.value());
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. No resynchronization
/// is attempted: a bad header is an error, not a reason to skip ahead.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Frame>> {
    for (position, &byte) in src.iter().take(HEADER.len()).enumerate() {
        if !is_header_byte(byte) {
            return Err(FrameError::BadHeader { position, byte });
        }
    }

    let Some(&length) = src.get(LENGTH_POS) else {
        return Ok(None); // Need more data
    };
    if !is_valid_length(length) {
        return Err(FrameError::InvalidLength(length));
    }

    let total = frame_len_for(length);
    if src.len() < total {
        return Ok(None); // Need more data
    }

    let mut sum = Checksum::new();
    sum.extend(&src[HEADER.len()..total - 1]);
    let received = src[total - 1];
    if !sum.matches(received) {
        return Err(FrameError::ChecksumMismatch {
            expected: sum.value(),
            actual: received,
        });
    }

    src.advance(HEADER.len());
    let id = src.get_u8();
    let _length = src.get_u8();
    let command = src.get_u8();
    let params = src.split_to(total - FRAME_OVERHEAD).freeze();
    src.advance(1);

    Ok(Some(Frame {
        id,
        command,
        params,
    }))
}

/// Whether `byte` is a valid header byte.
pub fn is_header_byte(byte: u8) -> bool {
    byte == HEADER_BYTE
}

/// Whether `byte` is a valid length byte (3..=7).
pub fn is_valid_length(byte: u8) -> bool {
    (MIN_LENGTH..=MAX_LENGTH).contains(&byte)
}

/// Total wire size implied by a length byte.
pub fn frame_len_for(length: u8) -> usize {
    length as usize + 3
}

fn check_param_count(count: usize) -> Result<()> {
    if count > MAX_PARAMS {
        return Err(FrameError::TooManyParams {
            count,
            max: MAX_PARAMS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::has_valid_checksum;

    fn encode(command: u8, params: &[u8], id: u8) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_frame(command, params, id, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_encode_zero_param_read() {
        let buf = encode(28, &[], 1);
        assert_eq!(buf.as_ref(), &[0x55, 0x55, 0x01, 0x03, 0x1C, 0xDF]);
    }

    #[test]
    fn test_encode_two_params() {
        let buf = encode(1, &[100, 0], 5);
        assert_eq!(buf.len(), 8);
        assert_eq!(buf[3], 0x05);
        assert_eq!(buf[7], 0x90);
    }

    #[test]
    fn test_encode_rejects_five_params() {
        let mut buf = BytesMut::new();
        let err = encode_frame(1, &[0; 5], 1, &mut buf).unwrap_err();
        assert_eq!(err, FrameError::TooManyParams { count: 5, max: 4 });
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_decode_roundtrip_all_param_counts() {
        let params = [0x00, 0x7F, 0x80, 0xFF];
        for count in 0..=MAX_PARAMS {
            for id in [0u8, 1, 253, BROADCAST_ID] {
                let mut buf = encode(0x1C, &params[..count], id);
                assert_eq!(buf.len(), FRAME_OVERHEAD + count);

                let frame = decode_frame(&mut buf).unwrap().unwrap();
                assert_eq!(frame.id, id);
                assert_eq!(frame.command, 0x1C);
                assert_eq!(frame.params.as_ref(), &params[..count]);
                assert!(buf.is_empty());
            }
        }
    }

    #[test]
    fn test_every_single_bit_flip_breaks_checksum() {
        for count in 0..=MAX_PARAMS {
            let params: Vec<u8> = (0..count as u8).map(|i| i.wrapping_mul(37)).collect();
            let clean = encode(0x07, &params, 3);
            assert!(has_valid_checksum(&clean));

            for index in 2..clean.len() {
                for bit in 0..8 {
                    let mut corrupted = clean.clone();
                    corrupted[index] ^= 1 << bit;
                    assert!(
                        !has_valid_checksum(&corrupted),
                        "flip of bit {bit} in byte {index} went unnoticed"
                    );
                }
            }
        }
    }

    #[test]
    fn test_decode_incomplete() {
        let full = encode(2, &[1, 2], 9);
        for cut in 0..full.len() {
            let mut partial = BytesMut::from(&full[..cut]);
            assert!(decode_frame(&mut partial).unwrap().is_none());
            assert_eq!(partial.len(), cut);
        }
    }

    #[test]
    fn test_decode_bad_header() {
        let mut buf = BytesMut::from(&[0x55, 0x54, 0x01, 0x03, 0x1C, 0xDF][..]);
        let err = decode_frame(&mut buf).unwrap_err();
        assert_eq!(err, FrameError::BadHeader { position: 1, byte: 0x54 });
    }

    #[test]
    fn test_decode_invalid_length() {
        for length in [0u8, 1, 2, 8, 0xFF] {
            let mut buf = BytesMut::from(&[0x55, 0x55, 0x01, length][..]);
            let err = decode_frame(&mut buf).unwrap_err();
            assert_eq!(err, FrameError::InvalidLength(length));
        }
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut buf = BytesMut::from(&[0x55, 0x55, 0x01, 0x03, 0x1C, 0xDE][..]);
        let err = decode_frame(&mut buf).unwrap_err();
        assert_eq!(
            err,
            FrameError::ChecksumMismatch {
                expected: 0xDF,
                actual: 0xDE
            }
        );
    }

    #[test]
    fn test_decode_leaves_following_bytes() {
        let mut buf = encode(28, &[], 1);
        buf.extend_from_slice(&[0x55, 0x55]);

        let frame = decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(frame.command, 28);
        assert_eq!(buf.as_ref(), &[0x55, 0x55]);
    }

    #[test]
    fn test_frame_helpers() {
        let frame = Frame::new(5, 1, vec![100, 0]).unwrap();
        assert_eq!(frame.length_byte(), 5);
        assert_eq!(frame.wire_size(), 8);
        assert_eq!(frame.to_bytes().unwrap().as_ref(), encode(1, &[100, 0], 5).as_ref());

        assert!(Frame::new(5, 1, vec![0; 5]).is_err());
    }

    #[test]
    fn test_predicates_mirror_encoder() {
        assert!(is_header_byte(0x55));
        assert!(!is_header_byte(0xFF));
        assert!(!is_valid_length(2));
        assert!(is_valid_length(3));
        assert!(is_valid_length(7));
        assert!(!is_valid_length(8));
        assert_eq!(frame_len_for(3), 6);
        assert_eq!(frame_len_for(MAX_LENGTH), MAX_FRAME_LEN);
    }
}
