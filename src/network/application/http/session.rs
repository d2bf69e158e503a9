//! Incremental dispatch of a completed payload.
//!
//! A [`StreamSession`] walks an assembled body and hands it to a callback. With
//! [`DispatchStrategy::TimeSliced`] it delivers one slice per step and arms a
//! one-shot [`Timer`] before returning to the main loop; the next step runs when
//! the timer fires. With [`DispatchStrategy::Immediate`] a single step delivers
//! everything.
//!
//! The session never owns the body. Each step borrows it again from the
//! accumulator, which stays untouched until the session finishes.
//!
//! # States
//!
//! ```text
//!  Idle ──fragment──▶ Receiving ──complete──▶ Ready ──begin──▶ Dispatching ──last slice──▶ Idle
//!    ▲                    │                     │                   │
//!    └──── Rejected ◀─────┴─────────────────────┘                   └──abort/drop──▶ Idle
//! ```
//!
//! Every exit from `Dispatching` goes through [`StreamSession::finish`], which
//! cancels an armed timer before anything else is released. Timer ticks carry a
//! [`TimerToken`]; a tick whose token is not the one currently armed is stale and
//! ignored.

use super::config::DispatchStrategy;

/// Identifies one arming of the chunk timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u32);

impl TimerToken {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// One-shot cooperative timer provided by the platform.
///
/// When an armed timer expires the platform must call back into the owning
/// handler with the same token (`on_timer`). Arming never runs the callback
/// synchronously.
pub trait Timer {
    /// Schedule a single tick carrying `token` after `after_ms` milliseconds.
    fn arm(&mut self, token: TimerToken, after_ms: u32);
    /// Drop the tick scheduled for `token` if it has not fired yet.
    fn cancel(&mut self, token: TimerToken);
}

/// Timer for handlers configured with [`DispatchStrategy::Immediate`], which
/// never arm one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTimer;

impl Timer for NoTimer {
    fn arm(&mut self, _token: TimerToken, _after_ms: u32) {}
    fn cancel(&mut self, _token: TimerToken) {}
}

/// Lifecycle of one body, from first fragment to cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No payload held.
    Idle,
    /// Fragments are being accumulated.
    Receiving,
    /// The full body is held and waits for delivery.
    Ready,
    /// The callback is being driven.
    Dispatching,
    /// The request was answered with an error. Transient: cleanup follows immediately.
    Rejected,
}

/// Result of one dispatch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// More slices remain; the timer was armed with this token.
    Pending(TimerToken),
    /// Everything was delivered, or there was nothing to deliver.
    Complete,
}

/// Dispatch state for one handler. At most one payload is dispatched at a time.
#[derive(Debug)]
pub struct StreamSession<Q> {
    state: State,
    request: Option<Q>,
    length: usize,
    cursor: usize,
    generation: u32,
    armed: Option<TimerToken>,
}

impl<Q> StreamSession<Q> {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            request: None,
            length: 0,
            cursor: 0,
            generation: 0,
            armed: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_dispatching(&self) -> bool {
        self.state == State::Dispatching
    }

    /// Offset of the next byte to deliver.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length of the payload being dispatched.
    pub fn length(&self) -> usize {
        self.length
    }

    /// The request being served, while dispatching.
    pub fn request(&self) -> Option<&Q> {
        self.request.as_ref()
    }

    /// Token of the pending tick, if any.
    pub fn armed(&self) -> Option<TimerToken> {
        self.armed
    }

    /// A fragment arrived. No effect while dispatching.
    pub fn mark_receiving(&mut self) {
        if matches!(self.state, State::Idle | State::Ready) {
            self.state = State::Receiving;
        }
    }

    /// The announced body length has arrived.
    pub fn mark_ready(&mut self) {
        if self.state == State::Receiving {
            self.state = State::Ready;
        }
    }

    /// Start dispatching `length` bytes on behalf of `request`.
    pub fn begin(&mut self, request: Q, length: usize) {
        debug!("dispatching {} bytes", length);
        self.state = State::Dispatching;
        self.request = Some(request);
        self.length = length;
        self.cursor = 0;
        self.armed = None;
    }

    /// Deliver the next slice of `body` (or all of it) to `on_chunk`.
    ///
    /// `body` must be the same bytes on every step of a dispatch.
    pub fn step<F, T>(
        &mut self,
        body: &[u8],
        strategy: DispatchStrategy,
        on_chunk: &mut F,
        timer: &mut T,
    ) -> Step
    where
        F: FnMut(&mut Q, &[u8]) + ?Sized,
        T: Timer + ?Sized,
    {
        if self.state != State::Dispatching {
            return Step::Complete;
        }
        let Some(request) = self.request.as_mut() else {
            return Step::Complete;
        };

        let body = &body[..self.length.min(body.len())];
        if self.cursor >= body.len() {
            return Step::Complete;
        }

        match strategy {
            DispatchStrategy::Immediate => {
                on_chunk(request, &body[self.cursor..]);
                self.cursor = body.len();
                Step::Complete
            }
            DispatchStrategy::TimeSliced {
                chunk_size,
                period_ms,
            } => {
                let end = self.cursor + chunk_size.max(1).min(body.len() - self.cursor);
                trace!("chunk {}..{} of {}", self.cursor, end, body.len());
                on_chunk(request, &body[self.cursor..end]);
                self.cursor = end;

                if self.cursor < body.len() {
                    self.generation = self.generation.wrapping_add(1);
                    let token = TimerToken(self.generation);
                    self.armed = Some(token);
                    timer.arm(token, period_ms);
                    Step::Pending(token)
                } else {
                    Step::Complete
                }
            }
        }
    }

    /// Consume a timer tick. Returns `false` for a stale token, in which case
    /// nothing must happen.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        if self.state == State::Dispatching && self.armed == Some(token) {
            self.armed = None;
            true
        } else {
            trace!("ignoring stale timer tick {}", token.0);
            false
        }
    }

    /// Record a rejection. The caller finishes the session right after.
    pub fn reject(&mut self) {
        self.state = State::Rejected;
    }

    /// Cancel any armed tick, give the request back and return to `Idle`.
    /// Safe to call in any state, any number of times.
    pub fn finish<T: Timer + ?Sized>(&mut self, timer: &mut T) -> Option<Q> {
        if let Some(token) = self.armed.take() {
            timer.cancel(token);
        }
        if self.state == State::Dispatching {
            debug!("dispatch ended at {} of {}", self.cursor, self.length);
        }
        self.generation = self.generation.wrapping_add(1);
        self.state = State::Idle;
        self.length = 0;
        self.cursor = 0;
        self.request.take()
    }
}

impl<Q> Default for StreamSession<Q> {
    fn default() -> Self {
        Self::new()
    }
}
