//! Collaborator abstractions for a half-duplex, single-wire servo bus.
//!
//! The protocol engine never touches hardware directly. It talks to:
//! - a [`SerialLink`]: byte-available query, single-byte read, buffered write
//! - a [`Clock`]: monotonic time and a short delay primitive
//! - an optional [`DirectionControl`] line for RS-485 style transceivers
//!
//! [`sim`] provides an in-memory wire that loops every written byte back to
//! the receiver, the way the physical bus does. The `serial` feature adds a
//! [`serialport`](https://docs.rs/serialport) backed link.

pub mod error;
pub mod sim;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use traits::{Clock, DirectionControl, SerialLink, SystemClock};

#[cfg(feature = "serial")]
pub use serial::{RtsDirection, SerialPortLink};
