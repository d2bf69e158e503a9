//! Common error types for transport operations

/// A common error type for transport operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An error occurred during a write operation.
    WriteError,
    /// The connection accepted zero bytes and cannot make progress.
    ConnectionClosed,
    /// The payload handed to the transport is not in a sendable state.
    InvalidPayload,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::InvalidPayload => defmt::write!(f, "InvalidPayload"),
        }
    }
}
