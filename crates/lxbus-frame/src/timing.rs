//! Wire-time model for the bus.
//!
//! Each byte on the wire is one start bit, eight data bits and one stop bit.
//! All bus waits are derived from [`Timing::byte_time`].

use std::time::Duration;

use crate::codec::FRAME_OVERHEAD;
use crate::error::TimingError;

/// Factory default baud rate of LX-16A servos.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Start + 8 data + stop.
pub const BITS_PER_BYTE: u64 = 10;

/// Added to the echo deadline after a transmit.
pub const ECHO_MARGIN: Duration = Duration::from_millis(2);

/// Time a servo may take to start answering a read.
pub const REPLY_ALLOWANCE: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    baud_rate: u32,
}

impl Timing {
    pub fn new(baud_rate: u32) -> Result<Self, TimingError> {
        if baud_rate == 0 {
            return Err(TimingError::ZeroBaudRate);
        }
        Ok(Self { baud_rate })
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Time needed to put `bytes` bytes on the wire.
    pub fn byte_time(&self, bytes: usize) -> Duration {
        let nanos = bytes as u128 * BITS_PER_BYTE as u128 * 1_000_000_000 / self.baud_rate as u128;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Pause between two reads while draining stale input.
    pub fn drain_delay(&self) -> Duration {
        self.byte_time(1)
    }

    /// Pause after a write before the echo is expected.
    pub fn settle_delay(&self) -> Duration {
        self.byte_time(1)
    }

    /// Deadline for the loopback echo of a `frame_len` byte frame.
    pub fn echo_timeout(&self, frame_len: usize, margin: Duration) -> Duration {
        self.byte_time(frame_len) + margin
    }

    /// Deadline for a reply carrying up to `capacity` parameter bytes.
    pub fn reply_timeout(&self, capacity: usize, allowance: Duration) -> Duration {
        self.byte_time(capacity + FRAME_OVERHEAD) + allowance
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_time_at_ten_kilobaud() {
        let timing = Timing::new(10_000).unwrap();
        assert_eq!(timing.byte_time(0), Duration::ZERO);
        assert_eq!(timing.byte_time(1), Duration::from_millis(1));
        assert_eq!(timing.byte_time(6), Duration::from_millis(6));
    }

    #[test]
    fn byte_time_at_default_rate() {
        let timing = Timing::default();
        assert_eq!(timing.baud_rate(), 115_200);
        // 10 bits / 115200 baud = 86.805 µs
        assert_eq!(timing.byte_time(1), Duration::from_nanos(86_805));
        assert_eq!(timing.drain_delay(), timing.byte_time(1));
        assert_eq!(timing.settle_delay(), timing.byte_time(1));
    }

    #[test]
    fn derived_deadlines() {
        let timing = Timing::new(10_000).unwrap();
        assert_eq!(
            timing.echo_timeout(6, ECHO_MARGIN),
            Duration::from_millis(8)
        );
        // Two params + overhead = 8 bytes, plus the servo allowance.
        assert_eq!(
            timing.reply_timeout(2, REPLY_ALLOWANCE),
            Duration::from_millis(28)
        );
    }

    #[test]
    fn zero_baud_rate_rejected() {
        assert_eq!(Timing::new(0), Err(TimingError::ZeroBaudRate));
    }

    #[test]
    fn huge_counts_saturate() {
        let timing = Timing::new(1).unwrap();
        assert_eq!(timing.byte_time(usize::MAX), Duration::from_nanos(u64::MAX));
    }
}
