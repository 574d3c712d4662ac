mod common;

use common::{Ping, Pong, routed, tagged};
use lightbus::{
    BusConfig, BusError, EventBus, EventHandler, FaultPolicy, HandlerError, RoutingMode, UiQueue,
    testing::Recorder,
};
use std::sync::Arc;

fn panicking(priority: i32) -> EventHandler {
    EventHandler::builder::<Ping>()
        .priority(priority)
        .action(|_| panic!("handler exploded"))
}

fn hooked(policy: FaultPolicy) -> (Recorder<String>, BusConfig) {
    let faults = Recorder::new();
    let sink = faults.clone();
    let config = BusConfig::new()
        .with_name("faulty")
        .with_fault_policy(policy)
        .with_fault_hook(move |fault| sink.push(fault.error().to_string()));
    (faults, config)
}

// ============================================================================
// Isolate
// ============================================================================

#[test]
fn panics_are_isolated_by_default() {
    let (faults, config) = hooked(FaultPolicy::Isolate);
    let bus = EventBus::with_config(config);
    let log = Recorder::new();
    bus.register(&[
        tagged::<Ping>(&log, "before", 2),
        panicking(1),
        tagged::<Ping>(&log, "after", 0),
    ]);

    assert!(bus.post(Ping(0)).is_ok());

    assert_eq!(log.snapshot(), vec!["before", "after"]);
    assert_eq!(faults.snapshot(), vec!["handler panicked: handler exploded".to_string()]);
    assert!(!bus.is_posting());
}

#[test]
fn returned_errors_are_reported() {
    let bus_faults = Recorder::new();
    let sink = bus_faults.clone();
    let bus = EventBus::with_config(BusConfig::new().with_fault_hook(move |fault| {
        sink.push((fault.bus().to_string(), fault.mode(), fault.event_type()));
    }));
    bus.register(&[EventHandler::builder::<Ping>()
        .try_action(|ping| if ping.0 > 0 { Err("too big".into()) } else { Ok(()) })]);

    bus.post(Ping(0)).unwrap();
    assert!(bus_faults.is_empty());

    bus.post(Ping(1)).unwrap();
    assert_eq!(
        bus_faults.snapshot(),
        vec![(
            bus.name().to_string(),
            RoutingMode::Inline,
            lightbus::EventType::of::<Ping>()
        )]
    );
}

#[test]
fn panicking_hook_does_not_abort_delivery() {
    let bus = EventBus::with_config(
        BusConfig::new().with_fault_hook(|_| panic!("hook exploded")),
    );
    let log = Recorder::new();
    bus.register(&[panicking(1), tagged::<Ping>(&log, "after", 0)]);

    assert!(bus.post(Ping(0)).is_ok());
    assert_eq!(log.snapshot(), vec!["after"]);
    assert!(!bus.is_posting());
}

// ============================================================================
// Propagate
// ============================================================================

#[test]
fn propagate_aborts_the_post() {
    let (faults, config) = hooked(FaultPolicy::Propagate);
    let bus = EventBus::with_config(config);
    let log = Recorder::new();
    bus.register(&[panicking(1), tagged::<Ping>(&log, "after", 0)]);

    let err = bus.post(Ping(0)).unwrap_err();

    assert!(matches!(
        err,
        BusError::Handler {
            source: HandlerError::Panicked(_),
            ..
        }
    ));
    assert!(log.is_empty());
    assert_eq!(faults.len(), 1);
    assert!(!bus.is_posting());
}

#[test]
fn propagate_discards_deferred_events() {
    let (_faults, config) = hooked(FaultPolicy::Propagate);
    let bus = Arc::new(EventBus::with_config(config));
    let log = Recorder::new();

    let weak = Arc::downgrade(&bus);
    bus.register(&[
        EventHandler::builder::<Ping>().priority(1).action(move |_| {
            if let Some(bus) = weak.upgrade() {
                bus.post(Pong(0)).unwrap();
            }
        }),
        panicking(0),
        tagged::<Pong>(&log, "pong", 0),
    ]);

    assert!(bus.post(Ping(0)).is_err());
    assert!(log.is_empty());

    // The thread is no longer marked as posting: the next post is delivered.
    bus.post(Pong(1)).unwrap();
    assert_eq!(log.snapshot(), vec!["pong"]);
}

#[test]
fn detached_faults_never_propagate() {
    let ui = UiQueue::bind_current();
    let (faults, config) = hooked(FaultPolicy::Propagate);
    let bus = EventBus::with_config(config.with_ui_thread(Arc::new(ui.clone())));
    bus.register(&[EventHandler::builder::<Ping>()
        .mode(RoutingMode::UiOrdered)
        .action(|_| panic!("late failure"))]);

    assert!(bus.post(Ping(0)).is_ok());
    assert!(faults.is_empty());

    ui.run_pending();
    assert_eq!(faults.snapshot(), vec!["handler panicked: late failure".to_string()]);
}

#[test]
fn sticky_replay_faults_are_reported_not_returned() {
    let (faults, config) = hooked(FaultPolicy::Propagate);
    let bus = EventBus::with_config(config);
    bus.post_sticky(Ping(0)).unwrap();

    let log = Recorder::new();
    bus.register(&[
        EventHandler::builder::<Ping>()
            .sticky(true)
            .action(|_| panic!("replay failure")),
        routed::<Ping>(&log, "plain", RoutingMode::Inline),
    ]);

    assert_eq!(faults.len(), 1);
    assert!(bus.has_subscriber_for::<Ping>());
    assert_eq!(bus.subscriber_count(lightbus::EventType::of::<Ping>()), 2);
}
