use std::time::Duration;

use lxbus_frame::{FrameError, TimingError};
use lxbus_transport::TransportError;

/// Errors that can occur during a bus exchange.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The request could not be encoded. Raised before any bus access.
    #[error("invalid argument: {0}")]
    InvalidArgument(FrameError),

    /// The echo of a transmitted frame differed from what was sent, or was
    /// short. Either another device drove the bus or nothing is listening.
    #[error("bus conflict: wrote {} bytes, {} echoed back", sent.len(), echoed.len())]
    Conflict { sent: Vec<u8>, echoed: Vec<u8> },

    /// The reply was not complete before its deadline.
    #[error("reply timed out after {timeout:?} ({received} of {expected} bytes)")]
    Timeout {
        expected: usize,
        received: usize,
        timeout: Duration,
    },

    /// Bad header, length or checksum in a reply.
    #[error("malformed reply: {0}")]
    Frame(FrameError),

    /// The reply came from another servo.
    #[error("reply from id {actual}, expected {expected}")]
    UnexpectedId { expected: u8, actual: u8 },

    /// The reply answers another command.
    #[error("reply to command {actual}, expected {expected}")]
    UnexpectedCommand { expected: u8, actual: u8 },

    /// The reply carries more parameter bytes than the destination holds.
    #[error("reply needs {needed} parameter bytes, buffer holds {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },

    /// The bus configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] TimingError),

    /// The link, or the direction line, failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<FrameError> for BusError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::TooManyParams { .. } => BusError::InvalidArgument(err),
            other => BusError::Frame(other),
        }
    }
}

/// Coarse failure cause of a [`BusError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    BusConflict,
    Timeout,
    FormatError,
    ChecksumError,
    Transport,
}

impl BusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BusError::InvalidArgument(_) | BusError::Config(_) => ErrorKind::InvalidArgument,
            BusError::Conflict { .. } => ErrorKind::BusConflict,
            BusError::Timeout { .. } => ErrorKind::Timeout,
            BusError::Frame(FrameError::ChecksumMismatch { .. }) => ErrorKind::ChecksumError,
            BusError::Frame(_)
            | BusError::UnexpectedId { .. }
            | BusError::UnexpectedCommand { .. }
            | BusError::CapacityExceeded { .. } => ErrorKind::FormatError,
            BusError::Transport(_) => ErrorKind::Transport,
        }
    }
}

pub type Result<T> = std::result::Result<T, BusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_errors_split_into_argument_and_format() {
        let err: BusError = FrameError::TooManyParams { count: 5, max: 4 }.into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err: BusError = FrameError::InvalidLength(9).into();
        assert_eq!(err.kind(), ErrorKind::FormatError);

        let err: BusError = FrameError::ChecksumMismatch {
            expected: 1,
            actual: 2,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ChecksumError);
    }

    #[test]
    fn conflict_message_counts_bytes() {
        let err = BusError::Conflict {
            sent: vec![0x55; 6],
            echoed: vec![0x55; 2],
        };
        assert_eq!(err.kind(), ErrorKind::BusConflict);
        assert_eq!(err.to_string(), "bus conflict: wrote 6 bytes, 2 echoed back");
    }

    #[test]
    fn transport_errors_keep_their_kind() {
        let err: BusError = TransportError::Io(std::io::Error::other("unplugged")).into();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
