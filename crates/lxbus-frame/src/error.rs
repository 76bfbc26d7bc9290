/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// More parameter bytes than a frame can carry.
    #[error("too many parameters ({count}, max {max})")]
    TooManyParams { count: usize, max: usize },

    /// A header position holds something other than `0x55`.
    #[error("invalid header byte 0x{byte:02x} at position {position}")]
    BadHeader { position: usize, byte: u8 },

    /// The length byte is outside 3..=7.
    #[error("invalid length byte {0} (expected 3..=7)")]
    InvalidLength(u8),

    /// The checksum byte does not match the frame contents.
    #[error("checksum mismatch (expected 0x{expected:02x}, got 0x{actual:02x})")]
    ChecksumMismatch { expected: u8, actual: u8 },
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Errors in timing configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimingError {
    #[error("baud rate must be greater than zero")]
    ZeroBaudRate,
}
