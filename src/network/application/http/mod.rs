//! JSON over HTTP for embedded web servers.
//!
//! This module adapts a cooperative, callback-driven HTTP server to JSON
//! request handling on devices with a small heap and a single main loop. The
//! server delivers a request body as fragments tagged with their offset and the
//! announced total length. A handler assembles them into one bounded buffer and,
//! once the request completes, hands the payload to user code either:
//!
//! - parsed, exactly once ([`CallbackJsonHandler`]), or
//! - raw, in fixed-size slices spread over timer ticks
//!   ([`StreamJsonHandler`]) so no single step blocks the loop for long.
//!
//! Outbound payloads are built with [`JsonResponse`] and pulled by the server
//! through [`JsonResponse::fill_buffer`].
//!
//! # Flow
//!
//! ```text
//! ┌─────────────┐  handle_body   ┌─────────────────┐  handle_request  ┌──────────────┐
//! │ HTTP server │───────────────▶│ BodyAccumulator │─────────────────▶│ JsonParser   │──▶ callback (once)
//! │ (transport) │                │ (bounded alloc) │                  └──────────────┘
//! └─────────────┘                └─────────────────┘                  ┌──────────────┐
//!        ▲                                │                           │ StreamSession│──▶ callback (per chunk)
//!        │ fill_buffer                    └──────────────────────────▶│ + Timer      │
//! ┌─────────────┐                                                     └──────────────┘
//! │ JsonResponse│
//! └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use core::cell::Cell;
//! use libiot_json::network::application::http::{
//!     CallbackJsonHandler, Method, Outcome, Request, SerdeJsonParser, StatusCode, WebHandler,
//! };
//!
//! #[derive(serde::Deserialize)]
//! struct Led {
//!     on: bool,
//! }
//!
//! struct Req<'a> {
//!     status: &'a Cell<u16>,
//! }
//!
//! impl Request for Req<'_> {
//!     fn method(&self) -> Method { Method::Post }
//!     fn url(&self) -> &str { "/led" }
//!     fn content_type(&self) -> &str { "application/json" }
//!     fn send(&mut self, status: StatusCode, _content_type: &str, _body: &str) {
//!         self.status.set(status.as_u16());
//!     }
//! }
//!
//! let status = Cell::new(0);
//! let mut handler = CallbackJsonHandler::<Req<'_>, _, _>::new(
//!     "/led",
//!     SerdeJsonParser::<Led>::new(),
//!     |req: &mut Req<'_>, led: Led| {
//!         req.send(StatusCode::Ok, "text/plain", if led.on { "on" } else { "off" })
//!     },
//! );
//!
//! let mut req = Req { status: &status };
//! assert!(handler.can_handle(&mut req));
//! let body = br#"{"on":true}"#;
//! handler.handle_body(&mut req, body, 0, body.len());
//! assert_eq!(handler.handle_request(req), Outcome::Delivered);
//! assert_eq!(status.get(), 200);
//! ```

#![allow(missing_docs)]
#![deny(unsafe_code)]

use core::ops::BitOr;

pub mod accumulator;
pub mod config;
pub mod cursor;
pub mod error;
pub mod handler;
pub mod parser;
pub mod response;
pub mod session;
pub mod shared;

#[cfg(test)]
mod tests;

pub use accumulator::BodyAccumulator;
pub use config::{
    Config, DEFAULT_CHUNK_PERIOD_MS, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONTENT_LENGTH,
    DispatchStrategy, JSON_MIMETYPE,
};
pub use cursor::CopyCursor;
pub use error::JsonError;
pub use handler::{CallbackJsonHandler, StreamJsonHandler};
pub use parser::{JsonParser, SerdeJsonParser};
pub use response::JsonResponse;
pub use session::{NoTimer, State, Step, StreamSession, Timer, TimerToken};
pub use shared::SharedHandler;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// The method token as it appears on the request line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Method::Get => 1 << 0,
            Method::Post => 1 << 1,
            Method::Put => 1 << 2,
            Method::Patch => 1 << 3,
            Method::Delete => 1 << 4,
            Method::Head => 1 << 5,
            Method::Options => 1 << 6,
        }
    }
}

/// A set of methods a handler is interested in.
///
/// Built with `|`:
///
/// ```rust
/// use libiot_json::network::application::http::{Method, MethodSet};
///
/// let set = Method::Post | Method::Put;
/// assert!(set.contains(Method::Put));
/// assert!(!set.contains(Method::Get));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSet(u8);

impl MethodSet {
    /// Matches no method at all.
    pub const NONE: MethodSet = MethodSet(0);
    /// Matches every method.
    pub const ANY: MethodSet = MethodSet(0x7F);
    /// The default for body-carrying JSON endpoints: POST, PUT and PATCH.
    pub const BODY: MethodSet =
        MethodSet(Method::Post.bit() | Method::Put.bit() | Method::Patch.bit());

    pub fn contains(&self, method: Method) -> bool {
        self.0 & method.bit() != 0
    }
}

impl Default for MethodSet {
    fn default() -> Self {
        MethodSet::BODY
    }
}

impl From<Method> for MethodSet {
    fn from(method: Method) -> Self {
        MethodSet(method.bit())
    }
}

impl BitOr for Method {
    type Output = MethodSet;

    fn bitor(self, rhs: Method) -> MethodSet {
        MethodSet(self.bit() | rhs.bit())
    }
}

impl BitOr<Method> for MethodSet {
    type Output = MethodSet;

    fn bitor(self, rhs: Method) -> MethodSet {
        MethodSet(self.0 | rhs.bit())
    }
}

impl BitOr for MethodSet {
    type Output = MethodSet;

    fn bitor(self, rhs: MethodSet) -> MethodSet {
        MethodSet(self.0 | rhs.0)
    }
}

/// Status codes this adapter answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200, the payload was accepted and handed to user code.
    Ok,
    /// 400, the body is missing, incomplete or not valid JSON.
    BadRequest,
    /// 413, the announced body length exceeds the configured maximum.
    PayloadTooLarge,
    /// 500, no callback configured or the heap is exhausted.
    InternalServerError,
    /// 503, a previous payload is still being dispatched.
    ServiceUnavailable,
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::InternalServerError => 500,
            StatusCode::ServiceUnavailable => 503,
        }
    }
}

/// Terminal result of [`WebHandler::handle_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The parsed payload was handed to the callback; the callback owns the response.
    Delivered,
    /// Chunked delivery started; the callback will be driven by timer ticks.
    Streaming,
    /// The request was answered with an error status.
    Rejected(JsonError),
}

/// The request object owned by the HTTP server collaborator.
///
/// Implementations are typically thin handles into the server's connection
/// table. Only what the JSON handlers need is exposed.
pub trait Request {
    /// Request method.
    fn method(&self) -> Method;
    /// Request path, without query string.
    fn url(&self) -> &str;
    /// Value of the `Content-Type` header, or an empty string.
    fn content_type(&self) -> &str;
    /// Answer the request with a status, content type and body.
    fn send(&mut self, status: StatusCode, content_type: &str, body: &str);
    /// Ask the server to keep a header around for later inspection.
    fn add_interesting_header(&mut self, _name: &str) {}
}

/// The handler side of the HTTP server collaborator.
///
/// The server asks [`can_handle`](WebHandler::can_handle) before reading any
/// body, pushes every body fragment through
/// [`handle_body`](WebHandler::handle_body), then calls
/// [`handle_request`](WebHandler::handle_request) once the request is complete.
pub trait WebHandler<Q> {
    /// Decide interest from method, path and content type.
    fn can_handle(&mut self, request: &mut Q) -> bool;
    /// Accept one body fragment: `data` belongs at `index` within a body of `total` bytes.
    fn handle_body(&mut self, request: &mut Q, data: &[u8], index: usize, total: usize);
    /// Produce a terminal outcome for a completed request.
    fn handle_request(&mut self, request: Q) -> Outcome;
    /// `true` when no callback is configured and the server may skip this handler.
    fn is_request_handler_trivial(&self) -> bool;
}

/// Path match: exact, or `uri` followed by a `/` segment. An empty `uri` matches everything.
pub(crate) fn uri_matches(uri: &str, url: &str) -> bool {
    if uri.is_empty() || uri == url {
        return true;
    }
    url.strip_prefix(uri)
        .is_some_and(|rest| rest.starts_with('/'))
}
