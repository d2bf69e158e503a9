//! Mock collaborators shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use libiot_json::network::application::http::{
    Method, Request, StatusCode, StreamJsonHandler, Timer, TimerToken,
};

/// What the handler did to a request.
#[derive(Debug, Default)]
pub struct Exchange {
    pub responses: Vec<(u16, String, String)>,
    pub interesting_headers: Vec<String>,
}

/// Request handle as the web server would pass it around.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: Method,
    pub url: &'static str,
    pub content_type: &'static str,
    pub exchange: Rc<RefCell<Exchange>>,
}

impl MockRequest {
    pub fn new(method: Method, url: &'static str, content_type: &'static str) -> Self {
        Self {
            method,
            url,
            content_type,
            exchange: Rc::new(RefCell::new(Exchange::default())),
        }
    }

    pub fn post(url: &'static str) -> Self {
        Self::new(Method::Post, url, "application/json")
    }

    /// Status of the single response sent, if any.
    pub fn status(&self) -> Option<u16> {
        let exchange = self.exchange.borrow();
        assert!(exchange.responses.len() <= 1, "request answered twice");
        exchange.responses.first().map(|(status, _, _)| *status)
    }

    pub fn response_body(&self) -> Option<String> {
        self.exchange
            .borrow()
            .responses
            .first()
            .map(|(_, _, body)| body.clone())
    }
}

impl Request for MockRequest {
    fn method(&self) -> Method {
        self.method
    }

    fn url(&self) -> &str {
        self.url
    }

    fn content_type(&self) -> &str {
        self.content_type
    }

    fn send(&mut self, status: StatusCode, content_type: &str, body: &str) {
        self.exchange.borrow_mut().responses.push((
            status.as_u16(),
            content_type.to_string(),
            body.to_string(),
        ));
    }

    fn add_interesting_header(&mut self, name: &str) {
        self.exchange
            .borrow_mut()
            .interesting_headers
            .push(name.to_string());
    }
}

/// Everything a [`MockTimer`] was asked to do.
#[derive(Debug, Default)]
pub struct TimerLog {
    pub pending: Option<TimerToken>,
    pub armed: Vec<(TimerToken, u32)>,
    pub cancelled: Vec<TimerToken>,
}

/// One-shot timer whose log outlives the handler that owns it.
#[derive(Debug, Clone, Default)]
pub struct MockTimer {
    pub log: Rc<RefCell<TimerLog>>,
}

impl Timer for MockTimer {
    fn arm(&mut self, token: TimerToken, after_ms: u32) {
        let mut log = self.log.borrow_mut();
        assert!(log.pending.is_none(), "timer armed twice");
        log.pending = Some(token);
        log.armed.push((token, after_ms));
    }

    fn cancel(&mut self, token: TimerToken) {
        let mut log = self.log.borrow_mut();
        if log.pending == Some(token) {
            log.pending = None;
        }
        log.cancelled.push(token);
    }
}

/// Fire due ticks until the handler stops arming the timer. Returns how many fired.
pub fn run_timers<F>(handler: &mut StreamJsonHandler<MockRequest, MockTimer, F>) -> usize
where
    F: FnMut(&mut MockRequest, &[u8]),
{
    let mut fired = 0;
    loop {
        let pending = handler.timer().log.borrow_mut().pending.take();
        match pending {
            Some(token) => {
                handler.on_timer(token);
                fired += 1;
            }
            None => return fired,
        }
    }
}

/// Deterministic filler of length `len`.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| b'a' + (i % 26) as u8).collect()
}
