use std::fmt;
use std::time::Duration;

use bytes::BytesMut;
use lxbus_frame::{encode_frame, Timing, MAX_FRAME_LEN};
use lxbus_transport::{Clock, DirectionControl, SerialLink, SystemClock};
use tracing::{debug, trace};

use crate::config::BusConfig;
use crate::error::{BusError, Result};
use crate::parser::{Progress, ResponseParser};
use crate::write::{SingleAttempt, WritePrimitive};

/// Boxed direction-control line owned by a [`Bus`].
pub type DirectionLine = Box<dyn DirectionControl + Send>;

/// One physical half-duplex servo bus.
///
/// Every method takes `&mut self`: a bus carries one exchange at a time, and
/// sharing it between callers needs external locking (e.g. a `Mutex`).
pub struct Bus<L, C = SystemClock> {
    link: L,
    clock: C,
    direction: Option<DirectionLine>,
    timing: Timing,
    config: BusConfig,
    last_command: Option<u8>,
}

impl<L: SerialLink> Bus<L, SystemClock> {
    /// Create a bus over `link` using the system clock.
    pub fn new(link: L, config: BusConfig) -> Result<Self> {
        Self::with_clock(link, SystemClock::new(), config)
    }
}

impl<L: SerialLink, C: Clock> Bus<L, C> {
    /// Create a bus with an explicit clock.
    pub fn with_clock(link: L, clock: C, config: BusConfig) -> Result<Self> {
        let timing = config.timing()?;
        Ok(Self {
            link,
            clock,
            direction: None,
            timing,
            config,
            last_command: None,
        })
    }

    /// Drive `line` high while transmitting.
    pub fn with_direction(mut self, line: impl DirectionControl + Send + 'static) -> Self {
        self.direction = Some(Box::new(line));
        self
    }

    pub fn set_direction_line(&mut self, line: Option<DirectionLine>) {
        self.direction = line;
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.config.verbose = verbose;
    }

    pub fn set_trace_bytes(&mut self, trace_bytes: bool) {
        self.config.trace_bytes = trace_bytes;
    }

    /// Command id of the most recent transmit attempt.
    pub fn last_command(&self) -> Option<u8> {
        self.last_command
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Borrow the underlying link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Mutably borrow the underlying link.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Consume the bus and return the link.
    pub fn into_link(self) -> L {
        self.link
    }

    /// Send one command frame and verify its loopback echo.
    ///
    /// Stale input is drained first. The call fails with
    /// [`BusError::Conflict`] if the echo differs from the frame at any
    /// position or does not fully arrive before the echo deadline.
    pub fn transmit(&mut self, command: u8, params: &[u8], id: u8) -> Result<()> {
        let mut frame = BytesMut::with_capacity(MAX_FRAME_LEN);
        encode_frame(command, params, id, &mut frame)?;

        self.last_command = Some(command);
        self.drain(command, id)?;

        let start = self.clock.now();
        self.drive_direction(true)?;
        let outcome = self.send_and_verify(&frame, command, id, start);
        let released = self.drive_direction(false);
        outcome?;
        released
    }

    /// Parse a reply to `command` from servo `id` into `dest`.
    ///
    /// Returns the number of parameter bytes written. `dest.len()` is the
    /// largest reply accepted and sizes the deadline. With
    /// [`BROADCAST_ID`](lxbus_frame::BROADCAST_ID) a reply from any servo is
    /// accepted.
    pub fn receive(&mut self, command: u8, dest: &mut [u8], id: u8) -> Result<usize> {
        let start = self.clock.now();
        let timeout = self
            .timing
            .reply_timeout(dest.len(), self.config.reply_allowance);
        let mut parser = ResponseParser::new(command, id, dest);

        loop {
            let Some(byte) = self.next_byte(start, timeout)? else {
                if self.config.verbose {
                    debug!(
                        command,
                        id,
                        expected = parser.expected_len(),
                        received = parser.position(),
                        "reply timed out"
                    );
                }
                return Err(BusError::Timeout {
                    expected: parser.expected_len(),
                    received: parser.position(),
                    timeout,
                });
            };

            if self.config.trace_bytes {
                trace!(position = parser.position(), byte = %Hex(&[byte]), "reply byte");
            }

            match parser.feed(byte) {
                Ok(Progress::Pending) => {}
                Ok(Progress::Complete { params }) => return Ok(params),
                Err(err) => {
                    if self.config.verbose {
                        debug!(command, id, error = %err, "reply rejected");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Request `command` from servo `id` and receive the reply into `dest`.
    ///
    /// The zero-parameter request goes through `writer`; if it fails, nothing
    /// is received. No retry happens here.
    pub fn read_no_retry<W>(
        &mut self,
        writer: &mut W,
        command: u8,
        dest: &mut [u8],
        id: u8,
    ) -> Result<usize>
    where
        W: WritePrimitive<L, C> + ?Sized,
    {
        if let Err(err) = writer.write(self, command, &[], id) {
            if self.config.verbose {
                debug!(command, id, error = %err, "read request failed");
            }
            return Err(err);
        }
        self.receive(command, dest, id)
    }

    /// [`read_no_retry`](Self::read_no_retry) with a single transmit attempt.
    pub fn read(&mut self, command: u8, dest: &mut [u8], id: u8) -> Result<usize> {
        self.read_no_retry(&mut SingleAttempt, command, dest, id)
    }

    /// Discard everything pending on the link, one byte-time apart.
    fn drain(&mut self, command: u8, id: u8) -> Result<usize> {
        let mut drained = 0usize;
        while self.link.available()? > 0 {
            let Some(byte) = self.link.read_byte()? else {
                break;
            };
            drained += 1;
            if self.config.verbose {
                debug!(count = drained, byte = %Hex(&[byte]), "discarded stale byte");
            }
            self.clock.delay(self.timing.drain_delay());
        }

        if drained > 0 && self.config.verbose {
            debug!(
                drained,
                id,
                command,
                last_command = ?self.last_command,
                "junk bytes on bus before transmit"
            );
        }
        Ok(drained)
    }

    fn send_and_verify(&mut self, frame: &[u8], command: u8, id: u8, start: Duration) -> Result<()> {
        self.link.write_all(frame)?;
        self.clock.delay(self.timing.settle_delay());

        let timeout = self
            .timing
            .echo_timeout(frame.len(), self.config.echo_margin);
        let mut echoed = Vec::with_capacity(frame.len());
        while echoed.len() < frame.len() {
            match self.next_byte(start, timeout)? {
                Some(byte) => echoed.push(byte),
                None => break,
            }
        }

        if echoed != frame {
            if self.config.verbose {
                debug!(
                    id,
                    command,
                    last_command = ?self.last_command,
                    wrote = %Hex(frame),
                    got = %Hex(&echoed),
                    "echo mismatch"
                );
            }
            return Err(BusError::Conflict {
                sent: frame.to_vec(),
                echoed,
            });
        }
        Ok(())
    }

    /// Next byte from the link, or `None` once `timeout` has passed since `start`.
    ///
    /// Idle iterations sleep for at most `poll_interval`.
    fn next_byte(&mut self, start: Duration, timeout: Duration) -> Result<Option<u8>> {
        loop {
            if self.clock.now().saturating_sub(start) >= timeout {
                return Ok(None);
            }
            if self.link.available()? > 0 {
                if let Some(byte) = self.link.read_byte()? {
                    return Ok(Some(byte));
                }
            }
            self.clock.delay(self.config.poll_interval);
        }
    }

    fn drive_direction(&mut self, transmit: bool) -> Result<()> {
        if let Some(line) = self.direction.as_mut() {
            line.set_transmit(transmit)?;
        }
        Ok(())
    }
}

impl<L: fmt::Debug, C: fmt::Debug> fmt::Debug for Bus<L, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("link", &self.link)
            .field("clock", &self.clock)
            .field("direction", &self.direction.is_some())
            .field("timing", &self.timing)
            .field("last_command", &self.last_command)
            .finish()
    }
}

/// Space-separated hex bytes for log fields.
struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lxbus_transport::sim::{SimClock, SimWire};

    use super::*;

    fn bus() -> Bus<SimWire, SimClock> {
        Bus::with_clock(SimWire::new(), SimClock::new(), BusConfig::default()).unwrap()
    }

    #[test]
    fn hex_formats_bytes() {
        assert_eq!(Hex(&[0x55, 0x05, 0xDF]).to_string(), "55 05 df");
        assert_eq!(Hex(&[]).to_string(), "");
    }

    #[test]
    fn rejects_zero_baud_rate() {
        let config = BusConfig {
            baud_rate: 0,
            ..BusConfig::default()
        };
        let err = Bus::with_clock(SimWire::new(), SimClock::new(), config).unwrap_err();
        assert!(matches!(err, BusError::Config(_)));
    }

    #[test]
    fn drain_waits_one_byte_time_per_byte() {
        let mut bus = bus();
        bus.link_mut().inject(&[1, 2, 3]);

        let drained = bus.drain(0, 1).unwrap();

        assert_eq!(drained, 3);
        assert_eq!(bus.clock().now(), bus.timing().drain_delay() * 3);
        assert_eq!(bus.link().pending(), 0);
    }

    #[test]
    fn next_byte_gives_up_at_deadline() {
        let mut bus = bus();
        let start = bus.clock().now();
        let timeout = Duration::from_millis(1);

        assert_eq!(bus.next_byte(start, timeout).unwrap(), None);
        let elapsed = bus.clock().now() - start;
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + bus.config().poll_interval + Duration::from_micros(1));
    }

    #[test]
    fn verbosity_flags_toggle() {
        let mut bus = bus();
        bus.set_verbose(true);
        bus.set_trace_bytes(true);
        assert!(bus.config().verbose);
        assert!(bus.config().trace_bytes);
    }
}
