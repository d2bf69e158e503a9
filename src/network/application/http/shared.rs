//! Handler access from more than one execution context.
//!
//! On single-core targets driven by one cooperative loop, a handler is only
//! ever touched from that loop and needs no locking. On targets where the timer
//! service runs in its own task or interrupt, the timer tick and the HTTP server
//! would mutate the same body buffer concurrently. [`SharedHandler`] serializes
//! every access through a `critical_section::Mutex`.
//!
//! Callbacks run inside the critical section. They must not call back into the
//! same `SharedHandler`.

use core::cell::RefCell;

use critical_section::Mutex;

use super::session::{Timer, TimerToken};
use super::{Outcome, Request, StreamJsonHandler, WebHandler};

/// A handler behind a critical-section mutex.
pub struct SharedHandler<H> {
    inner: Mutex<RefCell<H>>,
}

impl<H> core::fmt::Debug for SharedHandler<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SharedHandler { .. }")
    }
}

impl<H> SharedHandler<H> {
    pub const fn new(handler: H) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(handler)),
        }
    }

    /// Run `f` with exclusive access to the handler.
    pub fn lock<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    pub fn into_inner(self) -> H {
        self.inner.into_inner().into_inner()
    }

    /// Server-side entry points, callable through a shared reference.
    pub fn can_handle<Q>(&self, request: &mut Q) -> bool
    where
        H: WebHandler<Q>,
    {
        self.lock(|handler| handler.can_handle(request))
    }

    pub fn handle_body<Q>(&self, request: &mut Q, data: &[u8], index: usize, total: usize)
    where
        H: WebHandler<Q>,
    {
        self.lock(|handler| handler.handle_body(request, data, index, total))
    }

    pub fn handle_request<Q>(&self, request: Q) -> Outcome
    where
        H: WebHandler<Q>,
    {
        self.lock(|handler| handler.handle_request(request))
    }
}

impl<Q, T, F> SharedHandler<StreamJsonHandler<Q, T, F>>
where
    Q: Request,
    T: Timer,
    F: FnMut(&mut Q, &[u8]),
{
    /// Timer-service entry point.
    pub fn on_timer(&self, token: TimerToken) {
        self.lock(|handler| handler.on_timer(token))
    }
}
