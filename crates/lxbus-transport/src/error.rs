/// Errors that can occur while talking to the bus hardware.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the byte link.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The direction-control line could not be switched.
    #[error("direction control failed: {0}")]
    Direction(std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
