//! Bounded request body accumulator.
//!
//! The HTTP server delivers a body as fragments: `(data, offset, total)`. The
//! total is announced with the first fragment, fragments may come in any order,
//! and a connection may die half way. [`BodyAccumulator`] owns the single heap
//! allocation the body is assembled in and makes sure that:
//!
//! - nothing is allocated for a body larger than the configured maximum;
//! - a failed allocation degrades into an error, never an abort;
//! - no fragment can write outside the allocation;
//! - a body only counts as ready once every byte of the announced length has
//!   arrived, however often fragments repeat or overlap.

use alloc::vec::Vec;

use super::error::JsonError;

/// Assembles one request body at a time.
#[derive(Debug)]
pub struct BodyAccumulator {
    buffer: Vec<u8>,
    /// One bit per body byte, set once that byte has been written.
    coverage: Vec<u8>,
    declared_total: usize,
    received: usize,
    max_content_length: usize,
    in_flight: bool,
    failure: Option<JsonError>,
    dropped_fragments: usize,
}

impl BodyAccumulator {
    /// An empty accumulator that refuses bodies above `max_content_length`.
    pub fn new(max_content_length: usize) -> Self {
        Self {
            buffer: Vec::new(),
            coverage: Vec::new(),
            declared_total: 0,
            received: 0,
            max_content_length,
            in_flight: false,
            failure: None,
            dropped_fragments: 0,
        }
    }

    /// Accept one fragment of a body of `declared_total` bytes, to be placed at `offset`.
    ///
    /// The first fragment of a payload sizes the buffer. A fragment announcing a
    /// different total than the payload in flight supersedes it. Empty fragments
    /// and zero totals are ignored.
    ///
    /// Errors are informational: the payload state already records them and
    /// [`body`](Self::body) reports them again at delivery time.
    pub fn accept(
        &mut self,
        offset: usize,
        data: &[u8],
        declared_total: usize,
    ) -> Result<(), JsonError> {
        if declared_total == 0 || data.is_empty() {
            return Ok(());
        }

        if !self.in_flight || declared_total != self.declared_total {
            self.begin(declared_total);
        }
        if let Some(failure) = self.failure {
            return Err(failure);
        }

        match offset.checked_add(data.len()) {
            Some(end) if end <= self.buffer.len() => {
                self.buffer[offset..end].copy_from_slice(data);
                self.received += cover(&mut self.coverage, offset, end);
                Ok(())
            }
            _ => {
                self.dropped_fragments += 1;
                warn!(
                    "dropping fragment at {} (+{}) outside body of {}",
                    offset,
                    data.len(),
                    self.buffer.len()
                );
                Err(JsonError::OutOfBoundsFragment)
            }
        }
    }

    fn begin(&mut self, declared_total: usize) {
        if self.in_flight {
            debug!(
                "body of {} superseded by body of {}",
                self.declared_total, declared_total
            );
            self.buffer = Vec::new();
            self.coverage = Vec::new();
        }

        self.in_flight = true;
        self.declared_total = declared_total;
        self.received = 0;
        self.dropped_fragments = 0;
        self.failure = None;

        if declared_total > self.max_content_length {
            warn!(
                "body of {} exceeds maximum of {}",
                declared_total, self.max_content_length
            );
            self.buffer = Vec::new();
            self.coverage = Vec::new();
            self.failure = Some(JsonError::OversizedPayload);
            return;
        }

        let map_len = declared_total.div_ceil(8);
        if self.buffer.capacity() >= declared_total && self.coverage.capacity() >= map_len {
            trace!("reusing body allocation of {}", self.buffer.capacity());
            self.buffer.clear();
            self.coverage.clear();
        } else {
            self.buffer = Vec::new();
            self.coverage = Vec::new();
            if self.buffer.try_reserve_exact(declared_total).is_err()
                || self.coverage.try_reserve_exact(map_len).is_err()
            {
                warn!("cannot allocate {} bytes for body", declared_total);
                self.buffer = Vec::new();
                self.coverage = Vec::new();
                self.failure = Some(JsonError::AllocationFailure);
                return;
            }
            debug!("allocated {} bytes for body", declared_total);
        }
        self.buffer.resize(declared_total, 0);
        self.coverage.resize(map_len, 0);
    }

    /// `true` once a correctly sized buffer holds every announced byte.
    pub fn is_ready(&self) -> bool {
        self.is_allocated() && self.received == self.declared_total
    }

    /// `true` while a buffer sized for the payload in flight is present.
    pub fn is_allocated(&self) -> bool {
        self.in_flight
            && self.failure.is_none()
            && self.declared_total > 0
            && self.buffer.len() == self.declared_total
    }

    /// `true` between the first fragment of a payload and the next reset.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// The assembled body, or why there is none.
    pub fn body(&self) -> Result<&[u8], JsonError> {
        if !self.in_flight {
            return Err(JsonError::IncompleteBody);
        }
        if let Some(failure) = self.failure {
            return Err(failure);
        }
        if !self.is_ready() {
            return Err(JsonError::IncompleteBody);
        }
        Ok(&self.buffer[..self.declared_total])
    }

    /// Total announced for the payload in flight, 0 if none.
    pub fn declared_total(&self) -> usize {
        self.declared_total
    }

    /// Distinct body bytes written so far for the payload in flight. A byte
    /// written twice counts once.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Fragments of the payload in flight that were dropped as out of bounds.
    pub fn dropped_fragments(&self) -> usize {
        self.dropped_fragments
    }

    /// Capacity of the body buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Largest body this accumulator will allocate for.
    pub fn max_content_length(&self) -> usize {
        self.max_content_length
    }

    /// Change the ceiling. Applies from the next payload on.
    pub fn set_max_content_length(&mut self, max_content_length: usize) {
        self.max_content_length = max_content_length;
    }

    /// Forget the payload in flight and release the allocation. Idempotent.
    pub fn reset(&mut self) {
        self.clear();
        self.buffer = Vec::new();
        self.coverage = Vec::new();
    }

    /// Forget the payload in flight but keep the allocation for the next one.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.coverage.clear();
        self.declared_total = 0;
        self.received = 0;
        self.in_flight = false;
        self.failure = None;
        self.dropped_fragments = 0;
    }
}

/// Set the bits for `start..end` in `map`. Returns how many were not set before.
fn cover(map: &mut [u8], start: usize, end: usize) -> usize {
    let mut fresh = 0;
    let mut index = start;
    while index < end {
        let byte = index / 8;
        let bit = index % 8;
        if bit == 0 && end - index >= 8 {
            fresh += map[byte].count_zeros() as usize;
            map[byte] = u8::MAX;
            index += 8;
        } else {
            let mask = 1u8 << bit;
            if map[byte] & mask == 0 {
                map[byte] |= mask;
                fresh += 1;
            }
            index += 1;
        }
    }
    fresh
}
