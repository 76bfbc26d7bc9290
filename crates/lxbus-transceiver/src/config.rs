use std::time::Duration;

use lxbus_frame::{Timing, TimingError, DEFAULT_BAUD_RATE, ECHO_MARGIN, REPLY_ALLOWANCE};

/// Default upper bound on one idle iteration of a bus poll loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Bus timing and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Bit rate of the bus. Default: 115200.
    pub baud_rate: u32,
    /// Slack added to the echo deadline after a transmit. Default: 2 ms.
    pub echo_margin: Duration,
    /// Servo processing time allowed before a reply. Default: 20 ms.
    pub reply_allowance: Duration,
    /// Longest sleep between two polls of the link while waiting for bytes.
    /// Bounds how late a deadline can be noticed. Default: 100 µs.
    pub poll_interval: Duration,
    /// Log drained bytes, echo mismatches and rejected replies at `debug`.
    pub verbose: bool,
    /// Log every received reply byte at `trace`.
    pub trace_bytes: bool,
}

impl BusConfig {
    /// Check the configuration and derive the timing model from it.
    pub fn timing(&self) -> Result<Timing, TimingError> {
        Timing::new(self.baud_rate)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            echo_margin: ECHO_MARGIN,
            reply_allowance: REPLY_ALLOWANCE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            verbose: false,
            trace_bytes: false,
        }
    }
}
