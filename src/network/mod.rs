//! Transport-facing abstractions.
//!
//! The JSON handlers never own a socket. Body fragments are pushed into them by
//! the HTTP server collaborator, and outbound payloads are pulled out of them.
//! The only transport trait this crate needs is [`Write`], used to drain a
//! finished response into whatever connection the server hands over.

#![allow(missing_docs)]
#![deny(unsafe_code)]

/// Common error types for transport operations
pub mod error;

/// Application layer protocol support
pub mod application;

/// Re-exports of common traits
pub mod prelude {
    pub use super::Write;
}

pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection, returning how many bytes were accepted
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}
