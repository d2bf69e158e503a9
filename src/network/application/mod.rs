//! # Application Layer Protocols
//!
//! Application layer (OSI Layer 7) support for IoT devices that act as HTTP
//! servers. The [`http`] module holds the JSON request/response adapter:
//! bounded body accumulation, the copy cursor, time-sliced dispatch and the
//! handler types plugged into the device's web server.
//!
//! ## Design Principles
//!
//! - **Server Agnostic**: handlers talk to the server through the
//!   [`Request`](http::Request) and [`WebHandler`](http::WebHandler) traits
//! - **Bounded Memory**: one heap allocation per handler, capped by configuration
//! - **Cooperative**: large payloads are delivered in slices so the main loop is
//!   never starved

/// HTTP JSON handler implementation.
///
/// Accepts JSON request bodies in fragments and hands them to user callbacks,
/// either parsed in one shot or as raw time-sliced chunks.
pub mod http;
