use alloc::vec::Vec;

use super::*;

const MAX: usize = 64;

#[derive(Default)]
struct RecordingTimer {
    armed: Vec<(TimerToken, u32)>,
    cancelled: Vec<TimerToken>,
}

impl Timer for RecordingTimer {
    fn arm(&mut self, token: TimerToken, after_ms: u32) {
        self.armed.push((token, after_ms));
    }

    fn cancel(&mut self, token: TimerToken) {
        self.cancelled.push(token);
    }
}

// -------------------------
// BodyAccumulator
// -------------------------

#[test]
fn single_fragment_fills_body() {
    let mut acc = BodyAccumulator::new(MAX);
    assert_eq!(acc.accept(0, b"0123456789", 10), Ok(()));
    assert!(acc.is_ready());
    assert_eq!(acc.body(), Ok(&b"0123456789"[..]));
}

#[test]
fn oversized_body_is_never_allocated() {
    let mut acc = BodyAccumulator::new(5);
    assert_eq!(
        acc.accept(0, b"0123456789", 10),
        Err(JsonError::OversizedPayload)
    );
    assert_eq!(acc.capacity(), 0);
    assert!(!acc.is_allocated());
    assert_eq!(acc.declared_total(), 10);
    assert_eq!(acc.body(), Err(JsonError::OversizedPayload));

    // Later fragments of the same body keep reporting the same problem.
    assert_eq!(acc.accept(5, b"56789", 10), Err(JsonError::OversizedPayload));
    assert_eq!(acc.capacity(), 0);
}

#[test]
fn out_of_order_fragments() {
    let mut acc = BodyAccumulator::new(MAX);
    acc.accept(10, b"BBBBBBBBBB", 20).unwrap();
    assert!(acc.is_allocated());
    assert!(!acc.is_ready());
    acc.accept(0, b"AAAAAAAAAA", 20).unwrap();
    assert!(acc.is_ready());
    assert_eq!(acc.body(), Ok(&b"AAAAAAAAAABBBBBBBBBB"[..]));
}

#[test]
fn fragment_past_the_end_is_dropped() {
    let mut acc = BodyAccumulator::new(MAX);
    acc.accept(0, b"abcd", 8).unwrap();
    assert_eq!(
        acc.accept(6, b"xyz", 8),
        Err(JsonError::OutOfBoundsFragment)
    );
    assert_eq!(
        acc.accept(usize::MAX, b"x", 8),
        Err(JsonError::OutOfBoundsFragment)
    );
    assert_eq!(acc.dropped_fragments(), 2);
    assert_eq!(acc.received(), 4);
    assert_eq!(acc.body(), Err(JsonError::IncompleteBody));
}

#[test]
fn truncated_upload_is_not_ready() {
    let mut acc = BodyAccumulator::new(MAX);
    acc.accept(0, b"hello", 9).unwrap();
    assert!(acc.is_allocated());
    assert!(!acc.is_ready());
    assert_eq!(acc.body(), Err(JsonError::IncompleteBody));
}

#[test]
fn repeated_fragment_counts_once() {
    let mut acc = BodyAccumulator::new(MAX);
    acc.accept(0, b"hello", 9).unwrap();
    acc.accept(0, b"hello", 9).unwrap();
    assert_eq!(acc.received(), 5);
    assert!(!acc.is_ready());
    assert_eq!(acc.body(), Err(JsonError::IncompleteBody));
}

#[test]
fn overlapping_fragments_count_covered_bytes() {
    let mut acc = BodyAccumulator::new(MAX);
    acc.accept(0, b"0123456789", 20).unwrap();
    acc.accept(5, b"56789ABCDE", 20).unwrap();
    assert_eq!(acc.received(), 15);
    assert!(!acc.is_ready());

    acc.accept(12, b"CDEFGHIJ", 20).unwrap();
    assert_eq!(acc.received(), 20);
    assert_eq!(acc.body(), Ok(&b"0123456789ABCDEFGHIJ"[..]));
}

#[test]
fn failed_allocation_is_reported_and_recoverable() {
    let mut acc = BodyAccumulator::new(usize::MAX);
    assert_eq!(
        acc.accept(0, b"x", usize::MAX),
        Err(JsonError::AllocationFailure)
    );
    assert_eq!(acc.capacity(), 0);
    assert!(!acc.is_allocated());
    assert_eq!(acc.body(), Err(JsonError::AllocationFailure));

    acc.reset();
    acc.accept(0, b"{}", 2).unwrap();
    assert_eq!(acc.body(), Ok(&b"{}"[..]));
}

#[test]
fn empty_fragments_and_zero_totals_are_ignored() {
    let mut acc = BodyAccumulator::new(MAX);
    acc.accept(0, b"", 4).unwrap();
    acc.accept(0, b"abcd", 0).unwrap();
    assert!(!acc.is_in_flight());
    assert_eq!(acc.body(), Err(JsonError::IncompleteBody));
}

#[test]
fn different_total_supersedes_payload() {
    let mut acc = BodyAccumulator::new(MAX);
    acc.accept(0, b"abc", 6).unwrap();
    acc.accept(0, b"wxyz", 4).unwrap();
    assert_eq!(acc.declared_total(), 4);
    assert_eq!(acc.body(), Ok(&b"wxyz"[..]));
}

#[test]
fn clear_keeps_allocation_for_reuse() {
    let mut acc = BodyAccumulator::new(MAX);
    acc.accept(0, &[b'a'; 32], 32).unwrap();
    let capacity = acc.capacity();
    assert!(capacity >= 32);

    acc.clear();
    assert!(!acc.is_in_flight());
    assert_eq!(acc.capacity(), capacity);

    acc.accept(0, b"{}", 2).unwrap();
    assert_eq!(acc.capacity(), capacity);
    assert_eq!(acc.body(), Ok(&b"{}"[..]));
}

#[test]
fn reset_releases_and_is_idempotent() {
    let mut acc = BodyAccumulator::new(MAX);
    acc.accept(0, b"abcd", 4).unwrap();
    acc.reset();
    acc.reset();
    assert_eq!(acc.capacity(), 0);
    assert!(!acc.is_in_flight());
    assert!(!acc.is_ready());
    assert_eq!(acc.declared_total(), 0);
}

#[test]
fn ceiling_change_applies_to_next_payload() {
    let mut acc = BodyAccumulator::new(4);
    acc.set_max_content_length(8);
    assert_eq!(acc.accept(0, b"12345678", 8), Ok(()));
    assert!(acc.is_ready());
}

// -------------------------
// StreamSession
// -------------------------

fn collect(
    session: &mut StreamSession<Vec<usize>>,
    body: &[u8],
    strategy: DispatchStrategy,
    timer: &mut RecordingTimer,
) -> Step {
    session.step(
        body,
        strategy,
        &mut |seen: &mut Vec<usize>, chunk: &[u8]| seen.push(chunk.len()),
        timer,
    )
}

#[test]
fn time_sliced_session_arms_between_slices() {
    let body = [0u8; 2000];
    let strategy = DispatchStrategy::TimeSliced {
        chunk_size: 768,
        period_ms: 3,
    };
    let mut timer = RecordingTimer::default();
    let mut session = StreamSession::new();
    session.begin(Vec::new(), body.len());

    let Step::Pending(first) = collect(&mut session, &body, strategy, &mut timer) else {
        panic!("expected a pending step");
    };
    assert_eq!(session.cursor(), 768);
    assert_eq!(timer.armed, [(first, 3)]);

    assert!(session.fire(first));
    let Step::Pending(second) = collect(&mut session, &body, strategy, &mut timer) else {
        panic!("expected a pending step");
    };
    assert_ne!(first, second);

    assert!(session.fire(second));
    assert_eq!(
        collect(&mut session, &body, strategy, &mut timer),
        Step::Complete
    );

    let seen = session.finish(&mut timer).unwrap();
    assert_eq!(seen, [768, 768, 464]);
    assert_eq!(session.state(), State::Idle);
    assert!(timer.cancelled.is_empty());
}

#[test]
fn immediate_session_delivers_once() {
    let body = [0u8; 2000];
    let mut timer = RecordingTimer::default();
    let mut session = StreamSession::new();
    session.begin(Vec::new(), body.len());

    assert_eq!(
        collect(&mut session, &body, DispatchStrategy::Immediate, &mut timer),
        Step::Complete
    );
    assert_eq!(session.finish(&mut timer).unwrap(), [2000]);
    assert!(timer.armed.is_empty());
}

#[test]
fn stale_and_foreign_ticks_are_ignored() {
    let body = [0u8; 10];
    let strategy = DispatchStrategy::time_sliced(4);
    let mut timer = RecordingTimer::default();
    let mut session = StreamSession::new();
    session.begin(Vec::new(), body.len());

    let Step::Pending(token) = collect(&mut session, &body, strategy, &mut timer) else {
        panic!("expected a pending step");
    };
    assert!(session.fire(token));
    // The same tick delivered twice only counts once.
    assert!(!session.fire(token));

    let Step::Pending(token) = collect(&mut session, &body, strategy, &mut timer) else {
        panic!("expected a pending step");
    };
    session.finish(&mut timer);
    assert_eq!(timer.cancelled, [token]);
    assert!(!session.fire(token));
    assert_eq!(session.state(), State::Idle);
}

#[test]
fn zero_chunk_size_still_makes_progress() {
    let body = [0u8; 3];
    let strategy = DispatchStrategy::TimeSliced {
        chunk_size: 0,
        period_ms: 1,
    };
    let mut timer = RecordingTimer::default();
    let mut session = StreamSession::new();
    session.begin(Vec::new(), body.len());

    while let Step::Pending(token) = collect(&mut session, &body, strategy, &mut timer) {
        assert!(session.fire(token));
    }
    assert_eq!(session.finish(&mut timer).unwrap(), [1, 1, 1]);
}

#[test]
fn step_outside_dispatch_is_a_no_op() {
    let mut timer = RecordingTimer::default();
    let mut session: StreamSession<Vec<usize>> = StreamSession::new();
    assert_eq!(
        collect(&mut session, b"abc", DispatchStrategy::Immediate, &mut timer),
        Step::Complete
    );
    assert!(session.finish(&mut timer).is_none());
}

#[test]
fn receiving_and_ready_marks() {
    let mut session: StreamSession<()> = StreamSession::new();
    session.mark_ready();
    assert_eq!(session.state(), State::Idle);
    session.mark_receiving();
    assert_eq!(session.state(), State::Receiving);
    session.mark_ready();
    assert_eq!(session.state(), State::Ready);
    session.begin((), 1);
    session.mark_receiving();
    assert_eq!(session.state(), State::Dispatching);
}

// -------------------------
// Routing helpers
// -------------------------

#[test]
fn uri_matching() {
    assert!(uri_matches("", "/anything"));
    assert!(uri_matches("/api", "/api"));
    assert!(uri_matches("/api", "/api/led"));
    assert!(!uri_matches("/api", "/apis"));
    assert!(!uri_matches("/api", "/"));
}

#[test]
fn method_sets() {
    let set = MethodSet::default();
    assert!(set.contains(Method::Post));
    assert!(set.contains(Method::Put));
    assert!(set.contains(Method::Patch));
    assert!(!set.contains(Method::Get));
    assert!(!MethodSet::NONE.contains(Method::Get));
    assert!(MethodSet::ANY.contains(Method::Options));
    assert!((MethodSet::from(Method::Get) | Method::Delete).contains(Method::Delete));
}

#[test]
fn error_statuses() {
    assert_eq!(JsonError::OversizedPayload.status().as_u16(), 413);
    assert_eq!(JsonError::AllocationFailure.status().as_u16(), 500);
    assert_eq!(JsonError::NoHandlerConfigured.status().as_u16(), 500);
    assert_eq!(JsonError::IncompleteBody.status().as_u16(), 400);
    assert_eq!(JsonError::OutOfBoundsFragment.status().as_u16(), 400);
    assert_eq!(JsonError::MalformedContent.status().as_u16(), 400);
    assert_eq!(JsonError::Busy.status().as_u16(), 503);
}
