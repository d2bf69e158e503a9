//! JSON parser collaborator.
//!
//! The one-shot handler does not build JSON trees itself. It hands the
//! assembled body to a [`JsonParser`] and only invokes the user callback when
//! parsing succeeds.

use core::fmt;
use core::marker::PhantomData;

use serde::de::DeserializeOwned;

use super::error::JsonError;

/// Turns a complete body into whatever the user callback consumes.
pub trait JsonParser {
    /// The parsed root handed to the callback.
    type Entry;

    /// Parse `body`. Any syntax or shape error must be reported as
    /// [`JsonError::MalformedContent`].
    fn parse(&mut self, body: &[u8]) -> Result<Self::Entry, JsonError>;
}

/// Parses bodies into `T` with `serde-json-core`.
///
/// `T` must own its data (`heapless::String`, numbers, nested structs) since
/// the body buffer is released right after the callback returns.
pub struct SerdeJsonParser<T> {
    _entry: PhantomData<fn() -> T>,
}

impl<T> SerdeJsonParser<T> {
    pub fn new() -> Self {
        Self {
            _entry: PhantomData,
        }
    }
}

impl<T> Default for SerdeJsonParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeJsonParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SerdeJsonParser")
    }
}

impl<T: DeserializeOwned> JsonParser for SerdeJsonParser<T> {
    type Entry = T;

    fn parse(&mut self, body: &[u8]) -> Result<T, JsonError> {
        serde_json_core::from_slice::<T>(body)
            .map(|(entry, _)| entry)
            .map_err(|_| JsonError::MalformedContent)
    }
}
