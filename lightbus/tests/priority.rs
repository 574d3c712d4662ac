mod common;

use common::{Ping, Pong, tagged};
use lightbus::{EventBus, EventHandler, EventType, testing::Recorder};

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn higher_priority_runs_first() {
    let bus = EventBus::new();
    let log = Recorder::new();

    bus.register(&[
        tagged::<Ping>(&log, "h1", 1),
        tagged::<Ping>(&log, "h3", 3),
        tagged::<Ping>(&log, "h2", 2),
    ]);
    bus.post(Ping(0)).unwrap();

    assert_eq!(log.snapshot(), vec!["h3", "h2", "h1"]);
}

#[test]
fn equal_priorities_run_in_registration_order() {
    let bus = EventBus::new();
    let log = Recorder::new();

    bus.register(&[tagged::<Ping>(&log, "a", 0), tagged::<Ping>(&log, "b", 0)]);
    bus.register(&[tagged::<Ping>(&log, "top", 5)]);
    bus.register(&[tagged::<Ping>(&log, "c", 0), tagged::<Ping>(&log, "low", -5)]);
    bus.post(Ping(0)).unwrap();

    assert_eq!(log.snapshot(), vec!["top", "a", "b", "c", "low"]);
}

#[test]
fn handlers_only_receive_their_own_type() {
    let bus = EventBus::new();
    let log = Recorder::new();

    bus.register(&[tagged::<Ping>(&log, "ping", 0), tagged::<Pong>(&log, "pong", 0)]);
    bus.post(Pong(1)).unwrap();

    assert_eq!(log.snapshot(), vec!["pong"]);
}

#[test]
fn handler_receives_the_posted_value() {
    let bus = EventBus::new();
    let seen = Recorder::new();
    let sink = seen.clone();

    bus.register(&[EventHandler::new(move |ping: &Ping| sink.push(ping.0))]);
    for i in 0..3 {
        bus.post(Ping(i)).unwrap();
    }

    assert_eq!(seen.snapshot(), vec![0, 1, 2]);
}

#[test]
fn posting_without_subscribers_is_a_no_op() {
    let bus = EventBus::new();
    assert!(bus.post(Ping(0)).is_ok());
    assert!(!bus.is_posting());
}

// ============================================================================
// Unregistration
// ============================================================================

#[test]
fn unregistered_handlers_stop_receiving() {
    let bus = EventBus::new();
    let log = Recorder::new();
    let keep = tagged::<Ping>(&log, "keep", 0);
    let removed = tagged::<Ping>(&log, "removed", 1);

    bus.register(&[keep.clone(), removed.clone()]);
    bus.unregister(&[removed]);
    bus.post(Ping(0)).unwrap();

    assert_eq!(log.snapshot(), vec!["keep"]);
    assert_eq!(bus.subscriber_count(EventType::of::<Ping>()), 1);
}

#[test]
fn unregistering_unknown_handlers_is_a_no_op() {
    let bus = EventBus::new();
    let log = Recorder::new();
    bus.register(&[tagged::<Ping>(&log, "registered", 0)]);

    // Same settings, different identity.
    bus.unregister(&[tagged::<Ping>(&log, "registered", 0)]);
    bus.unregister(&[tagged::<Pong>(&log, "never", 0)]);
    bus.post(Ping(0)).unwrap();

    assert_eq!(log.snapshot(), vec!["registered"]);
}

#[test]
fn a_clone_unregisters_the_original() {
    let bus = EventBus::new();
    let log = Recorder::new();
    let handler = tagged::<Ping>(&log, "h", 0);

    bus.register(&[handler.clone()]);
    assert!(bus.has_subscriber_for::<Ping>());

    let copy = handler.clone();
    bus.unregister(&[copy]);
    assert!(!bus.has_subscriber_for::<Ping>());

    bus.post(Ping(0)).unwrap();
    assert!(log.is_empty());
}

#[test]
fn registering_twice_delivers_twice() {
    let bus = EventBus::new();
    let log = Recorder::new();
    let handler = tagged::<Ping>(&log, "h", 0);

    bus.register(&[handler.clone(), handler.clone()]);
    bus.post(Ping(0)).unwrap();
    assert_eq!(log.take(), vec!["h", "h"]);

    bus.unregister(&[handler]);
    bus.post(Ping(0)).unwrap();
    assert_eq!(log.take(), vec!["h"]);
}
