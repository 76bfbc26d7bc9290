//! Wire format of the LX-16A style half-duplex servo bus.
//!
//! Every command and reply is one frame:
//! - two header bytes `0x55 0x55`
//! - servo id, length, command id
//! - up to four parameter bytes
//! - a one-byte complement checksum over id..params
//!
//! The [`timing`] module turns byte counts into wire time so that every wait
//! on the bus can be bounded by a deadline.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod timing;

pub use checksum::{checksum, has_valid_checksum, Checksum};
pub use codec::{
    decode_frame, encode_frame, frame_len_for, is_header_byte, is_valid_length, Frame,
    BROADCAST_ID, FRAME_OVERHEAD, HEADER, HEADER_BYTE, MAX_FRAME_LEN, MAX_LENGTH, MAX_PARAMS,
    MIN_LENGTH,
};
pub use error::{FrameError, Result, TimingError};
pub use timing::{Timing, DEFAULT_BAUD_RATE, ECHO_MARGIN, REPLY_ALLOWANCE};
