//! Protocol engine for LX-16A style half-duplex serial servo buses.
//!
//! One wire carries both directions, so every transmitted byte is read back
//! by the sender. lxbus uses that echo to detect collisions and parses servo
//! replies under wire-time deadlines.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte link, clock and direction-line traits, simulated wire,
//!   serial port link (behind `serial` feature)
//! - [`frame`]: Frame codec, checksum, timing model
//! - [`transceiver`]: [`Bus`](transceiver::Bus): transmit, receive, read
//!
//! ```
//! use lxbus::frame::{Frame, BROADCAST_ID};
//! use lxbus::transceiver::{Bus, BusConfig};
//! use lxbus::transport::sim::{SimClock, SimWire};
//!
//! let mut wire = SimWire::new();
//! let reply = Frame::new(1, 28, vec![0xF4, 0x01]).unwrap();
//! wire.queue_reply(reply.to_bytes().unwrap().to_vec());
//!
//! let mut bus = Bus::with_clock(wire, SimClock::new(), BusConfig::default()).unwrap();
//! let mut position = [0u8; 2];
//! let count = bus.read(28, &mut position, BROADCAST_ID).unwrap();
//! assert_eq!(&position[..count], &[0xF4, 0x01]);
//! ```

/// Re-export transport types.
pub mod transport {
    pub use lxbus_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use lxbus_frame::*;
}

/// Re-export transceiver types.
pub mod transceiver {
    pub use lxbus_transceiver::*;
}
