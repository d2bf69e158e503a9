//! Handler configuration.
//!
//! Defaults mirror what a small Wi-Fi microcontroller can afford: bodies up to
//! 16 KiB, handed to user code in 1 KiB slices with a 3 ms pause in between.

use serde::Deserialize;

use super::error::JsonError;

/// Content type every JSON handler requires and every [`JsonResponse`](super::JsonResponse) carries.
pub const JSON_MIMETYPE: &str = "application/json";

/// Slice length used by [`DispatchStrategy::TimeSliced`] unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Pause between two slices, in milliseconds.
pub const DEFAULT_CHUNK_PERIOD_MS: u32 = 3;

/// Largest body a handler accepts unless configured otherwise.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 16384;

/// How a completed payload is handed to a streaming callback.
///
/// Both variants deliver the same bytes in the same order. They only differ in
/// how many callback invocations it takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStrategy {
    /// One invocation with the whole payload. For targets with enough headroom
    /// that a long callback does not starve anything.
    Immediate,
    /// One invocation per `chunk_size` bytes, with a one-shot timer of
    /// `period_ms` between invocations.
    TimeSliced {
        /// Bytes per invocation. Zero is treated as one.
        chunk_size: usize,
        /// Pause between invocations.
        period_ms: u32,
    },
}

impl DispatchStrategy {
    /// Time-sliced dispatch with the given chunk size and the default period.
    pub const fn time_sliced(chunk_size: usize) -> Self {
        DispatchStrategy::TimeSliced {
            chunk_size,
            period_ms: DEFAULT_CHUNK_PERIOD_MS,
        }
    }
}

impl Default for DispatchStrategy {
    fn default() -> Self {
        DispatchStrategy::time_sliced(DEFAULT_CHUNK_SIZE)
    }
}

/// Runtime configuration shared by both handler kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Upper bound on the announced body length. Larger bodies are answered with 413.
    pub max_content_length: usize,
    /// How streaming handlers hand the payload to their callback.
    pub strategy: DispatchStrategy,
    /// Keep the body allocation between requests instead of releasing it.
    pub retain_allocation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            strategy: DispatchStrategy::default(),
            retain_allocation: false,
        }
    }
}

/// On-disk / over-the-wire form of [`Config`].
///
/// Every field is optional:
///
/// ```json
/// { "max_content_length": 8192, "chunk_size": 512, "chunk_period_ms": 5 }
/// { "immediate": true }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    max_content_length: Option<usize>,
    immediate: bool,
    chunk_size: Option<usize>,
    chunk_period_ms: Option<u32>,
    retain_allocation: bool,
}

impl Config {
    /// Load a configuration from a JSON document, falling back to defaults for
    /// missing fields.
    ///
    /// ```rust
    /// use libiot_json::network::application::http::{Config, DispatchStrategy};
    ///
    /// let config = Config::from_json(br#"{"chunk_size":512}"#).unwrap();
    /// assert_eq!(config.strategy, DispatchStrategy::TimeSliced { chunk_size: 512, period_ms: 3 });
    /// ```
    pub fn from_json(bytes: &[u8]) -> Result<Self, JsonError> {
        let (file, _) = serde_json_core::from_slice::<ConfigFile>(bytes)
            .map_err(|_| JsonError::MalformedContent)?;

        let strategy = if file.immediate {
            DispatchStrategy::Immediate
        } else {
            match file.chunk_size {
                Some(0) => return Err(JsonError::MalformedContent),
                chunk_size => DispatchStrategy::TimeSliced {
                    chunk_size: chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
                    period_ms: file.chunk_period_ms.unwrap_or(DEFAULT_CHUNK_PERIOD_MS),
                },
            }
        };

        Ok(Self {
            max_content_length: file
                .max_content_length
                .unwrap_or(DEFAULT_MAX_CONTENT_LENGTH),
            strategy,
            retain_allocation: file.retain_allocation,
        })
    }
}
