use lxbus_transport::{Clock, SerialLink};

use crate::bus::Bus;
use crate::error::Result;

/// Sends the request frame of a read.
///
/// This is the seam for a retry wrapper: [`Bus::read_no_retry`] hands the
/// request to a `WritePrimitive` instead of calling [`Bus::transmit`]
/// directly. Closures with the same signature implement it too.
pub trait WritePrimitive<L, C> {
    fn write(&mut self, bus: &mut Bus<L, C>, command: u8, params: &[u8], id: u8) -> Result<()>;
}

/// Transmit exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleAttempt;

impl<L: SerialLink, C: Clock> WritePrimitive<L, C> for SingleAttempt {
    fn write(&mut self, bus: &mut Bus<L, C>, command: u8, params: &[u8], id: u8) -> Result<()> {
        bus.transmit(command, params, id)
    }
}

impl<L, C, F> WritePrimitive<L, C> for F
where
    F: FnMut(&mut Bus<L, C>, u8, &[u8], u8) -> Result<()>,
{
    fn write(&mut self, bus: &mut Bus<L, C>, command: u8, params: &[u8], id: u8) -> Result<()> {
        self(bus, command, params, id)
    }
}
