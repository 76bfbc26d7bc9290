use std::time::{Duration, Instant};

use crate::error::Result;

/// A byte-oriented serial link.
///
/// Every byte written onto a single-wire bus is also received back, so an
/// implementation must not filter its own transmission out of the receive
/// stream.
pub trait SerialLink {
    /// Number of received bytes waiting to be read.
    fn available(&mut self) -> Result<usize>;

    /// Read one byte without blocking. Returns `Ok(None)` if nothing is pending.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Write all bytes and flush them onto the wire.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<T: SerialLink + ?Sized> SerialLink for &mut T {
    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }
}

impl<T: SerialLink + ?Sized> SerialLink for Box<T> {
    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }
}

/// Monotonic time source plus the delay primitive used between bus bytes.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;

    /// Block the caller for at least `duration`.
    fn delay(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn delay(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Output line switching a half-duplex transceiver between drive and listen.
pub trait DirectionControl {
    /// `true` drives the bus, `false` returns the transceiver to listening.
    fn set_transmit(&mut self, transmit: bool) -> Result<()>;
}
