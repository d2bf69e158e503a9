//! # libiot-json - JSON request handling for embedded HTTP servers
//!
//! Lets a constrained, single-core microcontroller accept and serve JSON over
//! HTTP without blocking its cooperative main loop or exhausting its heap.
//!
//! ## Features
//!
//! ### Inbound
//! - **Bounded accumulation**: request bodies arrive as out-of-order fragments
//!   and are assembled in one allocation, capped by configuration
//! - **One-shot delivery**: the completed body is parsed (with
//!   `serde-json-core` or any [`JsonParser`](network::application::http::JsonParser))
//!   and handed to a callback once
//! - **Time-sliced delivery**: large bodies are handed to a callback in
//!   fixed-size slices spread over timer ticks
//!
//! ### Outbound
//! - **Pull-model responses**: a finished JSON payload is copied into
//!   server-provided buffers on demand, any window at a time
//!
//! Every failure (oversized body, heap exhaustion, truncated upload, malformed
//! JSON, missing callback) ends in a definite HTTP status and leaves the handler
//! reusable.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! libiot-json = "0.1.0"
//! ```
//!
//! ### Streaming a large body
//!
//! ```rust
//! use libiot_json::network::application::http::{
//!     Config, DispatchStrategy, Method, Outcome, Request, StatusCode, StreamJsonHandler, Timer,
//!     TimerToken, WebHandler,
//! };
//!
//! struct Req;
//! impl Request for Req {
//!     fn method(&self) -> Method { Method::Post }
//!     fn url(&self) -> &str { "/upload" }
//!     fn content_type(&self) -> &str { "application/json" }
//!     fn send(&mut self, _: StatusCode, _: &str, _: &str) {}
//! }
//!
//! // A timer that just remembers the last tick it was asked for.
//! #[derive(Default)]
//! struct Tick(Option<TimerToken>);
//! impl Timer for Tick {
//!     fn arm(&mut self, token: TimerToken, _after_ms: u32) { self.0 = Some(token); }
//!     fn cancel(&mut self, _token: TimerToken) { self.0 = None; }
//! }
//!
//! let mut received = 0;
//! let mut handler = StreamJsonHandler::new("/upload", Tick::default(), |_: &mut Req, chunk: &[u8]| {
//!     received += chunk.len();
//! })
//! .with_config(Config {
//!     strategy: DispatchStrategy::time_sliced(768),
//!     ..Config::default()
//! });
//!
//! let body = [b' '; 2000];
//! handler.handle_body(&mut Req, &body[..1000], 0, 2000);
//! handler.handle_body(&mut Req, &body[1000..], 1000, 2000);
//! assert_eq!(handler.handle_request(Req), Outcome::Streaming);
//!
//! // The main loop fires the timer whenever it comes due.
//! while let Some(token) = handler.timer_mut().0.take() {
//!     handler.on_timer(token);
//! }
//! drop(handler);
//! assert_eq!(received, 2000);
//! ```
//!
//! ## Platform Support
//!
//! The crate is `no_std` and needs only `alloc`. Timers and the HTTP server
//! are reached through the [`Timer`](network::application::http::Timer),
//! [`Request`](network::application::http::Request) and
//! [`WebHandler`](network::application::http::WebHandler) traits.
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Log through `defmt` and implement `defmt::Format` for error types
//! - `tracing`: Log through `tracing`

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]
#![doc(html_root_url = "https://shishir-dey.github.io/libiot/")]

extern crate alloc;

#[macro_use]
mod fmt;

/// Network layer: transport traits and the HTTP JSON adapter.
///
/// The adapter lives in [`network::application::http`]; the transport side is
/// limited to the [`Write`](network::Write) trait used to drain responses.
pub mod network;
