//! Outbound JSON payloads.
//!
//! A [`JsonResponse`] is built in two phases. First the serializer appends text
//! to it. Then [`set_length`](JsonResponse::set_length) freezes the length and
//! marks the payload valid, after which the HTTP server pulls it out piece by
//! piece with [`fill_buffer`](JsonResponse::fill_buffer). The server owns the
//! running offset; the response keeps no cursor of its own, so a fill can be
//! retried after a partial socket write.

use alloc::string::String;
use core::fmt;

use serde::Serialize;

use super::config::JSON_MIMETYPE;
use super::cursor::CopyCursor;
use super::error::JsonError;
use super::StatusCode;
use crate::network::Write;
use crate::network::error::Error as NetworkError;

/// A JSON response body with its status.
#[derive(Debug, Clone)]
pub struct JsonResponse {
    root: String,
    content_length: usize,
    valid: bool,
    status: StatusCode,
}

impl JsonResponse {
    /// An empty, not yet valid, 200 response.
    pub fn new() -> Self {
        Self::with_status(StatusCode::Ok)
    }

    /// An empty, not yet valid response answered with `status`.
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            root: String::new(),
            content_length: 0,
            valid: false,
            status,
        }
    }

    /// Serialize `value` with `serde-json-core` through an `N`-byte scratch
    /// string and return a finalized response.
    ///
    /// Fails with [`JsonError::OversizedPayload`] when the text does not fit in `N` bytes.
    pub fn from_serialize<T: Serialize, const N: usize>(value: &T) -> Result<Self, JsonError> {
        let text: heapless::String<N> =
            serde_json_core::to_string(value).map_err(|_| JsonError::OversizedPayload)?;
        let mut response = Self::new();
        response.push_str(&text);
        response.set_length();
        Ok(response)
    }

    /// Append text. Invalidates the payload until the next [`set_length`](Self::set_length).
    pub fn push_str(&mut self, text: &str) {
        self.valid = false;
        self.root.push_str(text);
    }

    /// The text built so far.
    pub fn as_str(&self) -> &str {
        &self.root
    }

    /// Length of the text built so far.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Freeze the current text as the payload. The payload is valid only if it
    /// is not empty. Returns the content length.
    pub fn set_length(&mut self) -> usize {
        self.content_length = self.root.len();
        self.valid = self.content_length > 0;
        self.content_length
    }

    /// Length frozen by the last [`set_length`](Self::set_length).
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn content_type(&self) -> &'static str {
        JSON_MIMETYPE
    }

    /// Copy the payload bytes starting at `sent_length` into `dest`.
    ///
    /// Returns how many bytes were produced; 0 means the payload is exhausted or
    /// not valid. The result depends only on the payload, `sent_length` and
    /// `dest.len()`.
    pub fn fill_buffer(&self, sent_length: usize, dest: &mut [u8]) -> usize {
        if !self.valid || dest.is_empty() || sent_length >= self.content_length {
            return 0;
        }

        let payload = &self.root.as_bytes()[..self.content_length];
        let mut cursor = CopyCursor::new(dest, sent_length, self.content_length - sent_length);
        cursor.write(payload);
        cursor.position()
    }

    /// Drain the whole payload into `connection`, `scratch.len()` bytes at a
    /// time, then flush. Short writes are retried from where they stopped.
    /// Returns the number of payload bytes written.
    pub fn write_to<W: Write>(
        &self,
        connection: &mut W,
        scratch: &mut [u8],
    ) -> Result<usize, NetworkError> {
        if !self.valid {
            return Err(NetworkError::InvalidPayload);
        }
        if scratch.is_empty() {
            return Err(NetworkError::WriteError);
        }

        let mut sent = 0;
        loop {
            let filled = self.fill_buffer(sent, scratch);
            if filled == 0 {
                break;
            }

            let mut written = 0;
            while written < filled {
                match connection.write(&scratch[written..filled]) {
                    Ok(0) => return Err(NetworkError::ConnectionClosed),
                    Ok(n) => written += n,
                    Err(_) => return Err(NetworkError::WriteError),
                }
            }
            sent += filled;
        }

        connection.flush().map_err(|_| NetworkError::WriteError)?;
        trace!("response of {} bytes written", sent);
        Ok(sent)
    }
}

impl Default for JsonResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for JsonResponse {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}
