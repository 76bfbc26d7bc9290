//! Protocol engine for the half-duplex single-wire servo bus.
//!
//! [`Bus`] owns one physical connection and performs strictly synchronous,
//! one-at-a-time exchanges:
//! - [`Bus::transmit`] drains stale input, writes a frame and checks that the
//!   wire echoed it back unchanged
//! - [`Bus::receive`] parses a servo reply byte by byte under a deadline
//! - [`Bus::read_no_retry`] sends a read request through a [`WritePrimitive`]
//!   and receives the reply
//!
//! Nothing here retries. Callers that want retries wrap these calls.

pub mod bus;
pub mod config;
pub mod error;
pub mod parser;
pub mod write;

pub use bus::{Bus, DirectionLine};
pub use config::BusConfig;
pub use error::{BusError, ErrorKind, Result};
pub use parser::{Progress, ResponseParser};
pub use write::{SingleAttempt, WritePrimitive};
