use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{DirectionControl, SerialLink};

/// Read timeout applied to the port. Reads only happen after
/// `bytes_to_read` reported data, so this is a safety net.
const READ_TIMEOUT: Duration = Duration::from_millis(2);

/// [`SerialLink`] over a host serial device (USB adapter, UART).
pub struct SerialPortLink {
    port: Box<dyn SerialPort>,
    path: String,
}

impl SerialPortLink {
    /// Open `path` at `baud_rate`, 8N1.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|err| TransportError::Open {
                path: path.to_string(),
                source: err.into(),
            })?;
        debug!(path, baud_rate, "opened serial link");
        Ok(Self::from_port(port, path))
    }

    /// Wrap an already configured port.
    pub fn from_port(port: Box<dyn SerialPort>, path: impl Into<String>) -> Self {
        Self {
            port,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Direction line driven through this port's RTS output.
    pub fn rts_direction(&self) -> Result<RtsDirection> {
        let port = self
            .port
            .try_clone()
            .map_err(|err| TransportError::Direction(err.into()))?;
        Ok(RtsDirection { port })
    }
}

impl SerialLink for SerialPortLink {
    fn available(&mut self) -> Result<usize> {
        let pending = self
            .port
            .bytes_to_read()
            .map_err(|err| TransportError::Io(err.into()))?;
        Ok(pending as usize)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.port.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::TimedOut
                        || err.kind() == ErrorKind::WouldBlock =>
                {
                    return Ok(None)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for SerialPortLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortLink")
            .field("path", &self.path)
            .finish()
    }
}

/// RS-485 driver-enable wired to the adapter's RTS pin.
pub struct RtsDirection {
    port: Box<dyn SerialPort>,
}

impl DirectionControl for RtsDirection {
    fn set_transmit(&mut self, transmit: bool) -> Result<()> {
        self.port
            .write_request_to_send(transmit)
            .map_err(|err| TransportError::Direction(err.into()))
    }
}

impl std::fmt::Debug for RtsDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtsDirection").finish_non_exhaustive()
    }
}
