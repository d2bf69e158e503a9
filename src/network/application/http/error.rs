//! Error kinds of the JSON handlers.

use super::StatusCode;

/// Everything that can go wrong between the first body fragment and the
/// user callback.
///
/// None of these escape as a panic. Each is converted into a terminal
/// [`StatusCode`] on the request and the handler is reset for the next one.
#[derive(Debug, PartialEq, Eq, Clone, Copy, thiserror::Error)]
pub enum JsonError {
    /// The announced body length exceeds the configured maximum. Detected
    /// before any allocation.
    #[error("announced body length exceeds the configured maximum")]
    OversizedPayload,
    /// The heap could not provide a buffer for the announced body length.
    #[error("body buffer allocation failed")]
    AllocationFailure,
    /// A fragment would have landed past the end of the body buffer and was
    /// dropped.
    #[error("fragment lies outside the announced body")]
    OutOfBoundsFragment,
    /// The body never reached the announced length, or was empty.
    #[error("request body is missing or incomplete")]
    IncompleteBody,
    /// The parser rejected the body.
    #[error("request body is not valid JSON")]
    MalformedContent,
    /// No callback is configured on the handler.
    #[error("no handler configured")]
    NoHandlerConfigured,
    /// A previous payload is still being dispatched.
    #[error("handler is busy dispatching a previous payload")]
    Busy,
}

impl JsonError {
    /// The status the request is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            JsonError::OversizedPayload => StatusCode::PayloadTooLarge,
            JsonError::AllocationFailure | JsonError::NoHandlerConfigured => {
                StatusCode::InternalServerError
            }
            JsonError::OutOfBoundsFragment
            | JsonError::IncompleteBody
            | JsonError::MalformedContent => StatusCode::BadRequest,
            JsonError::Busy => StatusCode::ServiceUnavailable,
        }
    }

    /// Plain-text body sent along with [`status`](Self::status).
    pub fn message(&self) -> &'static str {
        match self {
            JsonError::OversizedPayload => "Content too large",
            JsonError::AllocationFailure => "Out of memory",
            JsonError::OutOfBoundsFragment | JsonError::IncompleteBody => "Invalid request body",
            JsonError::MalformedContent => "Invalid JSON",
            JsonError::NoHandlerConfigured => "No handler configured",
            JsonError::Busy => "Handler busy",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for JsonError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            JsonError::OversizedPayload => defmt::write!(f, "OversizedPayload"),
            JsonError::AllocationFailure => defmt::write!(f, "AllocationFailure"),
            JsonError::OutOfBoundsFragment => defmt::write!(f, "OutOfBoundsFragment"),
            JsonError::IncompleteBody => defmt::write!(f, "IncompleteBody"),
            JsonError::MalformedContent => defmt::write!(f, "MalformedContent"),
            JsonError::NoHandlerConfigured => defmt::write!(f, "NoHandlerConfigured"),
            JsonError::Busy => defmt::write!(f, "Busy"),
        }
    }
}
