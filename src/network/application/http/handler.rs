//! Handlers plugged into the device's web server.
//!
//! Both handler kinds accept the same body fragments and answer the same error
//! statuses. They differ in how the completed body reaches user code:
//!
//! - [`CallbackJsonHandler`] parses it and calls the callback once with the
//!   parsed root;
//! - [`StreamJsonHandler`] hands the raw bytes over in slices, driven by a
//!   [`Timer`], so a large body never monopolizes the main loop.
//!
//! After every delivery attempt, successful or not, the body is released and the
//! handler is ready for the next request.

use core::marker::PhantomData;

use super::accumulator::BodyAccumulator;
use super::config::{Config, DispatchStrategy, JSON_MIMETYPE};
use super::error::JsonError;
use super::parser::JsonParser;
use super::session::{State, Step, StreamSession, Timer, TimerToken};
use super::{MethodSet, Outcome, Request, WebHandler, uri_matches};

/// Routing and body state shared by both handler kinds.
#[derive(Debug)]
struct JsonHandlerBase {
    uri: &'static str,
    methods: MethodSet,
    config: Config,
    accumulator: BodyAccumulator,
}

impl JsonHandlerBase {
    fn new(uri: &'static str, config: Config) -> Self {
        Self {
            uri,
            methods: MethodSet::default(),
            config,
            accumulator: BodyAccumulator::new(config.max_content_length),
        }
    }

    fn matches<Q: Request>(&self, request: &Q) -> bool {
        self.methods.contains(request.method())
            && uri_matches(self.uri, request.url())
            && request.content_type().eq_ignore_ascii_case(JSON_MIMETYPE)
    }

    fn set_config(&mut self, config: Config) {
        self.config = config;
        self.accumulator
            .set_max_content_length(config.max_content_length);
    }

    fn release(&mut self) {
        if self.config.retain_allocation {
            self.accumulator.clear();
        } else {
            self.accumulator.reset();
        }
    }
}

fn answer<Q: Request>(request: &mut Q, error: JsonError) {
    let status = error.status();
    info!("rejecting request with {}: {}", status.as_u16(), error.message());
    request.send(status, "text/plain", error.message());
}

/// Parses the completed body and calls the user callback once with the result.
///
/// ```rust
/// use libiot_json::network::application::http::{
///     CallbackJsonHandler, JsonError, Method, Outcome, Request, SerdeJsonParser, StatusCode,
///     WebHandler,
/// };
///
/// #[derive(Debug, serde::Deserialize)]
/// struct Reading {
///     celsius: i16,
/// }
///
/// #[derive(Default)]
/// struct Req {
///     answered: Option<StatusCode>,
/// }
///
/// impl Request for Req {
///     fn method(&self) -> Method { Method::Put }
///     fn url(&self) -> &str { "/sensor/1" }
///     fn content_type(&self) -> &str { "Application/JSON" }
///     fn send(&mut self, status: StatusCode, _: &str, _: &str) { self.answered = Some(status); }
/// }
///
/// let mut handler = CallbackJsonHandler::<Req, _, _>::new(
///     "/sensor",
///     SerdeJsonParser::<Reading>::new(),
///     |req: &mut Req, reading: Reading| {
///         assert_eq!(reading.celsius, -4);
///         req.send(StatusCode::Ok, "text/plain", "ok");
///     },
/// );
///
/// let mut req = Req::default();
/// assert!(handler.can_handle(&mut req));
/// handler.accept_fragment(11, b"-4}", 14);
/// handler.accept_fragment(0, br#"{"celsius":"#, 14);
/// assert!(handler.is_ready());
/// assert_eq!(handler.deliver_once(&mut req), Outcome::Delivered);
/// assert_eq!(req.answered, Some(StatusCode::Ok));
///
/// // A body that does not parse is answered with 400.
/// let mut req = Req::default();
/// handler.accept_fragment(0, b"{]", 2);
/// assert_eq!(handler.deliver_once(&mut req), Outcome::Rejected(JsonError::MalformedContent));
/// assert_eq!(req.answered, Some(StatusCode::BadRequest));
/// ```
#[derive(Debug)]
pub struct CallbackJsonHandler<Q, P, F> {
    base: JsonHandlerBase,
    parser: P,
    on_request: Option<F>,
    _request: PhantomData<fn(&mut Q)>,
}

impl<Q, P, F> CallbackJsonHandler<Q, P, F>
where
    Q: Request,
    P: JsonParser,
    F: FnMut(&mut Q, P::Entry),
{
    /// Handler for `uri` that parses with `parser` and calls `on_request`.
    pub fn new(uri: &'static str, parser: P, on_request: F) -> Self {
        Self {
            base: JsonHandlerBase::new(uri, Config::default()),
            parser,
            on_request: Some(on_request),
            _request: PhantomData,
        }
    }

    /// Handler without a callback. It never claims a request, and answers 500
    /// if one is forced on it.
    pub fn unconfigured(uri: &'static str, parser: P) -> Self {
        Self {
            base: JsonHandlerBase::new(uri, Config::default()),
            parser,
            on_request: None,
            _request: PhantomData,
        }
    }

    /// Builder form of the configuration. Replaces the defaults wholesale.
    pub fn with_config(mut self, config: Config) -> Self {
        self.base.set_config(config);
        self
    }

    /// Replace the callback.
    pub fn on_request(&mut self, on_request: F) {
        self.on_request = Some(on_request);
    }

    /// Methods this handler claims. Defaults to POST, PUT and PATCH.
    pub fn set_methods(&mut self, methods: impl Into<MethodSet>) {
        self.base.methods = methods.into();
    }

    /// Change the body ceiling. Applies from the next payload on.
    pub fn set_max_content_length(&mut self, max_content_length: usize) {
        self.base.config.max_content_length = max_content_length;
        self.base
            .accumulator
            .set_max_content_length(max_content_length);
    }

    pub fn config(&self) -> &Config {
        &self.base.config
    }

    pub fn accumulator(&self) -> &BodyAccumulator {
        &self.base.accumulator
    }

    /// `Idle`, `Receiving` or `Ready`; delivery is synchronous so this handler
    /// is never observed `Dispatching`.
    pub fn state(&self) -> State {
        let accumulator = &self.base.accumulator;
        if accumulator.is_ready() {
            State::Ready
        } else if accumulator.is_in_flight() {
            State::Receiving
        } else {
            State::Idle
        }
    }

    /// Store one body fragment. Problems are remembered and reported by
    /// [`deliver_once`](Self::deliver_once).
    pub fn accept_fragment(&mut self, offset: usize, data: &[u8], declared_total: usize) {
        let _ = self.base.accumulator.accept(offset, data, declared_total);
    }

    /// `true` once the whole announced body is held.
    pub fn is_ready(&self) -> bool {
        self.base.accumulator.is_ready()
    }

    /// Parse the held body and hand it to the callback, or answer the request
    /// with the matching error status. The body is released either way.
    pub fn deliver_once(&mut self, request: &mut Q) -> Outcome {
        let result = self.try_deliver(request);
        self.base.release();

        match result {
            Ok(()) => Outcome::Delivered,
            Err(error) => {
                answer(request, error);
                Outcome::Rejected(error)
            }
        }
    }

    fn try_deliver(&mut self, request: &mut Q) -> Result<(), JsonError> {
        let on_request = self
            .on_request
            .as_mut()
            .ok_or(JsonError::NoHandlerConfigured)?;
        let body = self.base.accumulator.body()?;
        let entry = self.parser.parse(body)?;
        debug!("delivering parsed body of {} bytes", body.len());
        on_request(request, entry);
        Ok(())
    }
}

impl<Q, P, F> WebHandler<Q> for CallbackJsonHandler<Q, P, F>
where
    Q: Request,
    P: JsonParser,
    F: FnMut(&mut Q, P::Entry),
{
    fn can_handle(&mut self, request: &mut Q) -> bool {
        if self.on_request.is_none() || !self.base.matches(request) {
            return false;
        }
        if self.base.accumulator.is_in_flight() {
            debug!("discarding body left over from an unfinished request");
            self.base.release();
        }
        request.add_interesting_header("ANY");
        true
    }

    fn handle_body(&mut self, _request: &mut Q, data: &[u8], index: usize, total: usize) {
        self.accept_fragment(index, data, total);
    }

    fn handle_request(&mut self, mut request: Q) -> Outcome {
        self.deliver_once(&mut request)
    }

    fn is_request_handler_trivial(&self) -> bool {
        self.on_request.is_none()
    }
}

/// Hands the completed body to the user callback as raw slices.
///
/// With [`DispatchStrategy::TimeSliced`] the first slice is delivered from
/// [`deliver_streamed`](Self::deliver_streamed) and each following one from
/// [`on_timer`](Self::on_timer), which the platform calls when the armed
/// [`Timer`] expires. While a payload is being dispatched the handler refuses new
/// bodies: fragments are dropped and new requests are answered with 503.
///
/// Dropping the handler, or reconfiguring it mid-dispatch, cancels the pending
/// tick and releases the body.
pub struct StreamJsonHandler<Q, T: Timer, F> {
    base: JsonHandlerBase,
    on_request: Option<F>,
    session: StreamSession<Q>,
    timer: T,
}

impl<Q, T, F> StreamJsonHandler<Q, T, F>
where
    Q: Request,
    T: Timer,
    F: FnMut(&mut Q, &[u8]),
{
    /// Handler for `uri` that slices bodies with the default strategy, arming `timer` between slices.
    pub fn new(uri: &'static str, timer: T, on_request: F) -> Self {
        Self {
            base: JsonHandlerBase::new(uri, Config::default()),
            on_request: Some(on_request),
            session: StreamSession::new(),
            timer,
        }
    }

    /// Handler without a callback. It never claims a request, and answers 500
    /// if one is forced on it.
    pub fn unconfigured(uri: &'static str, timer: T) -> Self {
        Self {
            base: JsonHandlerBase::new(uri, Config::default()),
            on_request: None,
            session: StreamSession::new(),
            timer,
        }
    }

    /// Builder form of [`set_config`](Self::set_config).
    pub fn with_config(mut self, config: Config) -> Self {
        self.set_config(config);
        self
    }

    /// Replace the whole configuration. Aborts a dispatch in progress.
    pub fn set_config(&mut self, config: Config) {
        self.abort();
        self.base.set_config(config);
    }

    /// Switch between immediate and time-sliced delivery. Aborts a dispatch in progress.
    pub fn set_strategy(&mut self, strategy: DispatchStrategy) {
        self.abort();
        self.base.config.strategy = strategy;
    }

    /// Aborts a dispatch in progress.
    pub fn set_max_content_length(&mut self, max_content_length: usize) {
        let mut config = self.base.config;
        config.max_content_length = max_content_length;
        self.set_config(config);
    }

    /// Replace the callback. Aborts a dispatch in progress.
    pub fn on_request(&mut self, on_request: F) {
        self.abort();
        self.on_request = Some(on_request);
    }

    /// Methods this handler claims. Defaults to POST, PUT and PATCH.
    pub fn set_methods(&mut self, methods: impl Into<MethodSet>) {
        self.base.methods = methods.into();
    }

    pub fn config(&self) -> &Config {
        &self.base.config
    }

    pub fn accumulator(&self) -> &BodyAccumulator {
        &self.base.accumulator
    }

    pub fn session(&self) -> &StreamSession<Q> {
        &self.session
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn state(&self) -> State {
        self.session.state()
    }

    /// Store one body fragment. Dropped while a previous payload is dispatching.
    pub fn accept_fragment(&mut self, offset: usize, data: &[u8], declared_total: usize) {
        if self.session.is_dispatching() {
            warn!("dropping fragment at {} while dispatching", offset);
            return;
        }

        let _ = self.base.accumulator.accept(offset, data, declared_total);
        if !self.base.accumulator.is_in_flight() {
            return;
        }
        self.session.mark_receiving();
        if self.base.accumulator.is_ready() {
            self.session.mark_ready();
        }
    }

    /// `true` once the whole announced body is held and not yet dispatched.
    pub fn is_ready(&self) -> bool {
        !self.session.is_dispatching() && self.base.accumulator.is_ready()
    }

    /// Start handing the held body to the callback, or answer the request with
    /// the matching error status and release the body.
    ///
    /// Returns [`Outcome::Streaming`] once dispatch has started; with
    /// [`DispatchStrategy::Immediate`] or a body no longer than one slice it has
    /// already finished by then.
    pub fn deliver_streamed(&mut self, mut request: Q) -> Outcome {
        if self.session.is_dispatching() {
            answer(&mut request, JsonError::Busy);
            return Outcome::Rejected(JsonError::Busy);
        }

        let length = match self.streamable() {
            Ok(length) => length,
            Err(error) => {
                self.session.reject();
                self.cleanup();
                answer(&mut request, error);
                return Outcome::Rejected(error);
            }
        };

        self.session.begin(request, length);
        self.pump();
        Outcome::Streaming
    }

    /// Deliver the next slice. Called by the platform when the timer armed with
    /// `token` expires. Stale tokens are ignored.
    pub fn on_timer(&mut self, token: TimerToken) {
        if self.session.fire(token) {
            self.pump();
        }
    }

    /// Stop a dispatch in progress, cancel its timer and release the body.
    /// Returns the request being served, if any.
    pub fn abort(&mut self) -> Option<Q> {
        if self.session.is_dispatching() {
            warn!(
                "aborting dispatch at {} of {}",
                self.session.cursor(),
                self.session.length()
            );
            return self.cleanup();
        }
        None
    }

    fn streamable(&self) -> Result<usize, JsonError> {
        if self.on_request.is_none() {
            return Err(JsonError::NoHandlerConfigured);
        }
        self.base.accumulator.body().map(<[u8]>::len)
    }

    fn pump(&mut self) {
        let step = match (self.on_request.as_mut(), self.base.accumulator.body()) {
            (Some(on_request), Ok(body)) => {
                self.session
                    .step(body, self.base.config.strategy, on_request, &mut self.timer)
            }
            _ => Step::Complete,
        };

        if step == Step::Complete {
            self.cleanup();
        }
    }

    fn cleanup(&mut self) -> Option<Q> {
        let request = self.session.finish(&mut self.timer);
        self.base.release();
        request
    }
}

impl<Q, T, F> WebHandler<Q> for StreamJsonHandler<Q, T, F>
where
    Q: Request,
    T: Timer,
    F: FnMut(&mut Q, &[u8]),
{
    fn can_handle(&mut self, request: &mut Q) -> bool {
        if self.on_request.is_none() || !self.base.matches(request) {
            return false;
        }
        if !self.session.is_dispatching() && self.base.accumulator.is_in_flight() {
            debug!("discarding body left over from an unfinished request");
            self.cleanup();
        }
        request.add_interesting_header("ANY");
        true
    }

    fn handle_body(&mut self, _request: &mut Q, data: &[u8], index: usize, total: usize) {
        self.accept_fragment(index, data, total);
    }

    fn handle_request(&mut self, request: Q) -> Outcome {
        self.deliver_streamed(request)
    }

    fn is_request_handler_trivial(&self) -> bool {
        self.on_request.is_none()
    }
}

impl<Q, T: Timer, F> Drop for StreamJsonHandler<Q, T, F> {
    fn drop(&mut self) {
        self.session.finish(&mut self.timer);
    }
}

impl<Q, T: Timer + core::fmt::Debug, F> core::fmt::Debug for StreamJsonHandler<Q, T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamJsonHandler")
            .field("base", &self.base)
            .field("configured", &self.on_request.is_some())
            .field("state", &self.session.state())
            .field("timer", &self.timer)
            .finish()
    }
}
