//! In-memory bus for tests and dry runs.
//!
//! [`SimWire`] behaves like the single-wire bus seen from the controller:
//! whatever is written comes straight back as echo, optionally followed by a
//! servo reply. [`SimClock`] only moves when someone delays on it, which keeps
//! deadline handling deterministic.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::Result;
use crate::traits::{Clock, DirectionControl, SerialLink};

/// How the simulated wire echoes a transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    /// Every written byte comes back unchanged.
    Faithful,
    /// Nothing comes back (no bus, or the line is held).
    Silent,
    /// The byte at `index` comes back XORed with `mask`, as if another
    /// device drove the line at the same time.
    Corrupt { index: usize, mask: u8 },
    /// Only the first `n` bytes come back.
    Truncate(usize),
}

type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send>;

/// Simulated half-duplex wire with loopback.
pub struct SimWire {
    rx: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
    replies: VecDeque<Vec<u8>>,
    responder: Option<Responder>,
    echo: Echo,
    bytes_read: usize,
}

impl SimWire {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            writes: Vec::new(),
            replies: VecDeque::new(),
            responder: None,
            echo: Echo::Faithful,
            bytes_read: 0,
        }
    }

    /// Place bytes in the receive queue as if they were already on the wire.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Queue a reply to be delivered after the echo of the next write.
    pub fn queue_reply(&mut self, reply: impl Into<Vec<u8>>) {
        self.replies.push_back(reply.into());
    }

    /// Answer writes with a function of the written frame.
    ///
    /// Queued replies take precedence over the responder.
    pub fn set_responder<F>(&mut self, responder: F)
    where
        F: FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static,
    {
        self.responder = Some(Box::new(responder));
    }

    pub fn set_echo(&mut self, echo: Echo) {
        self.echo = echo;
    }

    /// Every frame written so far, oldest first.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    pub fn last_write(&self) -> Option<&[u8]> {
        self.writes.last().map(Vec::as_slice)
    }

    /// Bytes still waiting in the receive queue.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Total bytes handed out by [`SerialLink::read_byte`].
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    fn echo_of(&self, bytes: &[u8]) -> Vec<u8> {
        match self.echo {
            Echo::Faithful => bytes.to_vec(),
            Echo::Silent => Vec::new(),
            Echo::Corrupt { index, mask } => {
                let mut echoed = bytes.to_vec();
                if let Some(byte) = echoed.get_mut(index) {
                    *byte ^= mask;
                }
                echoed
            }
            Echo::Truncate(n) => bytes[..n.min(bytes.len())].to_vec(),
        }
    }
}

impl Default for SimWire {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SimWire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimWire")
            .field("pending", &self.rx.len())
            .field("writes", &self.writes.len())
            .field("queued_replies", &self.replies.len())
            .field("responder", &self.responder.is_some())
            .field("echo", &self.echo)
            .finish()
    }
}

impl SerialLink for SimWire {
    fn available(&mut self) -> Result<usize> {
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.rx.pop_front();
        if byte.is_some() {
            self.bytes_read += 1;
        }
        Ok(byte)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let echoed = self.echo_of(bytes);
        self.rx.extend(echoed);

        let reply = match self.replies.pop_front() {
            Some(reply) => Some(reply),
            None => self.responder.as_mut().and_then(|respond| respond(bytes)),
        };
        if let Some(reply) = reply {
            self.rx.extend(reply);
        }

        self.writes.push(bytes.to_vec());
        Ok(())
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    nanos: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    /// Advances the clock. Zero delays still move it by 1 µs so that poll
    /// loops always reach their deadline.
    fn delay(&self, duration: Duration) {
        let nanos = if duration.is_zero() {
            1_000
        } else {
            duration.as_nanos() as u64
        };
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

/// Direction line that records every level it is driven to.
#[derive(Debug, Clone, Default)]
pub struct SimDirection {
    levels: Arc<Mutex<Vec<bool>>>,
}

impl SimDirection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Levels driven so far, oldest first.
    pub fn levels(&self) -> Vec<bool> {
        self.levels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether the line is currently in the transmit state.
    pub fn is_transmitting(&self) -> bool {
        self.levels().last().copied().unwrap_or(false)
    }
}

impl DirectionControl for SimDirection {
    fn set_transmit(&mut self, transmit: bool) -> Result<()> {
        self.levels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(transmit);
        Ok(())
    }
}
