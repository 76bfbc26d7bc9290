//! Byte-at-a-time reply parser.
//!
//! Positions and their checks:
//! ```text
//! 0, 1        header (0x55)
//! 2           id (any id when the request used BROADCAST_ID)
//! 3           length 3..=7, must fit the destination
//! 4           command
//! 5..len-2    params, copied to dest[pos - 5]
//! len-1       checksum over positions 2..len-2
//! ```

use lxbus_frame::{
    frame_len_for, is_header_byte, is_valid_length, Checksum, FrameError, BROADCAST_ID,
    FRAME_OVERHEAD,
};

use crate::error::{BusError, Result};

/// Frame length assumed until the length byte has been seen.
pub const INITIAL_EXPECTED_LEN: usize = 7;

const PARAMS_POS: usize = 5;

/// Result of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More bytes are needed.
    Pending,
    /// The checksum matched; `params` bytes were written to the destination.
    Complete { params: usize },
}

/// Parse state for one reply.
///
/// Parameter bytes go straight into the caller's buffer. After an error the
/// buffer may be partially written and must not be trusted.
#[derive(Debug)]
pub struct ResponseParser<'a> {
    command: u8,
    id: u8,
    dest: &'a mut [u8],
    position: usize,
    expected_len: usize,
    checksum: Checksum,
    complete: Option<usize>,
}

impl<'a> ResponseParser<'a> {
    pub fn new(command: u8, id: u8, dest: &'a mut [u8]) -> Self {
        Self {
            command,
            id,
            dest,
            position: 0,
            expected_len: INITIAL_EXPECTED_LEN,
            checksum: Checksum::new(),
            complete: None,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total frame length, refined once the length byte arrives.
    pub fn expected_len(&self) -> usize {
        self.expected_len
    }

    /// Consume one byte.
    ///
    /// Once [`Progress::Complete`] has been returned, further bytes are not
    /// consumed and the same result is returned again.
    pub fn feed(&mut self, byte: u8) -> Result<Progress> {
        if let Some(params) = self.complete {
            return Ok(Progress::Complete { params });
        }

        let position = self.position;
        match position {
            0 | 1 => {
                if !is_header_byte(byte) {
                    return Err(FrameError::BadHeader { position, byte }.into());
                }
            }
            2 => {
                if byte != self.id && self.id != BROADCAST_ID {
                    return Err(BusError::UnexpectedId {
                        expected: self.id,
                        actual: byte,
                    });
                }
            }
            3 => {
                if !is_valid_length(byte) {
                    return Err(FrameError::InvalidLength(byte).into());
                }
                let total = frame_len_for(byte);
                if total > self.dest.len() + FRAME_OVERHEAD {
                    return Err(BusError::CapacityExceeded {
                        needed: total - FRAME_OVERHEAD,
                        capacity: self.dest.len(),
                    });
                }
                self.expected_len = total;
            }
            4 => {
                if byte != self.command {
                    return Err(BusError::UnexpectedCommand {
                        expected: self.command,
                        actual: byte,
                    });
                }
            }
            _ if position == self.expected_len - 1 => {
                if !self.checksum.matches(byte) {
                    return Err(FrameError::ChecksumMismatch {
                        expected: self.checksum.value(),
                        actual: byte,
                    }
                    .into());
                }
                let params = position - PARAMS_POS;
                self.position += 1;
                self.complete = Some(params);
                return Ok(Progress::Complete { params });
            }
            _ => {
                let offset = position - PARAMS_POS;
                let Some(slot) = self.dest.get_mut(offset) else {
                    return Err(BusError::CapacityExceeded {
                        needed: offset + 1,
                        capacity: self.dest.len(),
                    });
                };
                *slot = byte;
            }
        }

        if position >= 2 {
            self.checksum.push(byte);
        }
        self.position += 1;
        Ok(Progress::Pending)
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use lxbus_frame::encode_frame;

    use super::*;
    use crate::error::ErrorKind;

    fn frame(command: u8, params: &[u8], id: u8) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(command, params, id, &mut buf).unwrap();
        buf.to_vec()
    }

    fn parse(bytes: &[u8], command: u8, id: u8, dest: &mut [u8]) -> Result<Progress> {
        let mut parser = ResponseParser::new(command, id, dest);
        let mut progress = Progress::Pending;
        for &byte in bytes {
            progress = parser.feed(byte)?;
            if let Progress::Complete { .. } = progress {
                break;
            }
        }
        Ok(progress)
    }

    #[test]
    fn parses_two_param_reply() {
        let mut dest = [0u8; 2];
        let progress = parse(&frame(28, &[0xF4, 0x01], 1), 28, 1, &mut dest).unwrap();
        assert_eq!(progress, Progress::Complete { params: 2 });
        assert_eq!(dest, [0xF4, 0x01]);
    }

    #[test]
    fn parses_reply_shorter_than_capacity() {
        let mut dest = [0xAAu8; 4];
        let progress = parse(&frame(14, &[0x01], 3), 14, 3, &mut dest).unwrap();
        assert_eq!(progress, Progress::Complete { params: 1 });
        assert_eq!(dest, [0x01, 0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn parses_zero_param_reply() {
        let mut dest = [0u8; 0];
        let progress = parse(&frame(7, &[], 2), 7, 2, &mut dest).unwrap();
        assert_eq!(progress, Progress::Complete { params: 0 });
    }

    #[test]
    fn wildcard_accepts_any_id() {
        for id in [0u8, 1, 42, 253] {
            let mut dest = [0u8; 1];
            let progress = parse(&frame(14, &[id], id), 14, BROADCAST_ID, &mut dest).unwrap();
            assert_eq!(progress, Progress::Complete { params: 1 });
            assert_eq!(dest[0], id);
        }
    }

    #[test]
    fn rejects_other_servo() {
        let mut dest = [0u8; 1];
        let err = parse(&frame(14, &[0], 2), 14, 1, &mut dest).unwrap_err();
        assert!(matches!(
            err,
            BusError::UnexpectedId {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn rejects_bad_header_without_resync() {
        let mut bytes = frame(14, &[0], 1);
        bytes.insert(0, 0x00);
        let mut dest = [0u8; 1];
        let err = parse(&bytes, 14, 1, &mut dest).unwrap_err();
        assert!(matches!(
            err,
            BusError::Frame(FrameError::BadHeader {
                position: 0,
                byte: 0x00
            })
        ));
    }

    #[test]
    fn rejects_length_out_of_range() {
        for length in [0u8, 2, 8, 0xFF] {
            let mut dest = [0u8; 4];
            let err = parse(&[0x55, 0x55, 0x01, length], 14, 1, &mut dest).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::FormatError);
            assert!(matches!(err, BusError::Frame(FrameError::InvalidLength(l)) if l == length));
        }
    }

    #[test]
    fn rejects_length_beyond_capacity_before_writing() {
        let mut dest = [0xEEu8; 1];
        let err = parse(&frame(28, &[1, 2, 3], 1), 28, 1, &mut dest).unwrap_err();
        assert!(matches!(
            err,
            BusError::CapacityExceeded {
                needed: 3,
                capacity: 1
            }
        ));
        assert_eq!(dest, [0xEE]);
    }

    #[test]
    fn rejects_other_command() {
        let mut dest = [0u8; 1];
        let err = parse(&frame(15, &[0], 1), 14, 1, &mut dest).unwrap_err();
        assert!(matches!(
            err,
            BusError::UnexpectedCommand {
                expected: 14,
                actual: 15
            }
        ));
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut bytes = frame(28, &[0x10, 0x20], 1);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let mut dest = [0u8; 2];
        let err = parse(&bytes, 28, 1, &mut dest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChecksumError);
    }

    #[test]
    fn incomplete_reply_stays_pending() {
        let bytes = frame(28, &[0x10, 0x20], 1);
        let mut dest = [0u8; 2];
        let mut parser = ResponseParser::new(28, 1, &mut dest);
        for &byte in &bytes[..bytes.len() - 1] {
            assert_eq!(parser.feed(byte).unwrap(), Progress::Pending);
        }
        assert_eq!(parser.position(), bytes.len() - 1);
        assert_eq!(parser.expected_len(), bytes.len());
    }

    #[test]
    fn expected_len_starts_at_minimum_assumption() {
        let mut dest = [0u8; 4];
        let mut parser = ResponseParser::new(1, 1, &mut dest);
        assert_eq!(parser.expected_len(), INITIAL_EXPECTED_LEN);
        for byte in [0x55, 0x55, 0x01, 0x03] {
            parser.feed(byte).unwrap();
        }
        assert_eq!(parser.expected_len(), 6);
    }

    #[test]
    fn stops_after_checksum() {
        let bytes = frame(7, &[], 2);
        let mut dest = [0u8; 0];
        let mut parser = ResponseParser::new(7, 2, &mut dest);
        for &byte in &bytes {
            parser.feed(byte).unwrap();
        }
        let consumed = parser.position();
        assert_eq!(
            parser.feed(0x55).unwrap(),
            Progress::Complete { params: 0 }
        );
        assert_eq!(parser.position(), consumed);
    }
}
