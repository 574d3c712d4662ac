//! Handler fault reporting.

use lightbus_core::{BusError, EventHandler, EventType, EventView, HandlerError, RoutingMode};
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
use tracing::warn;

/// Callback receiving every handler fault of a bus.
pub type FaultHook = Arc<dyn Fn(&Fault) + Send + Sync>;

/// What a bus does when a handler invoked on the posting thread faults.
///
/// Handlers run on the UI thread or by a poster are detached from the post
/// that routed them, so their faults are always isolated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Report the fault and keep delivering.
    #[default]
    Isolate,
    /// Report the fault, abandon the post and return the error from it.
    Propagate,
}

/// A handler that returned an error or panicked.
#[derive(Debug)]
pub struct Fault {
    bus: Arc<str>,
    event_type: EventType,
    mode: RoutingMode,
    error: HandlerError,
}

impl Fault {
    /// Name of the bus that delivered the event.
    pub fn bus(&self) -> &str {
        &self.bus
    }

    /// The type the faulting handler was registered for.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// The faulting handler's routing mode.
    pub fn mode(&self) -> RoutingMode {
        self.mode
    }

    /// What went wrong.
    pub fn error(&self) -> &HandlerError {
        &self.error
    }

    /// Convert into the error a propagating post returns.
    pub fn into_error(self) -> BusError {
        BusError::Handler {
            event_type: self.event_type.name(),
            source: self.error,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} handler for `{}` on bus `{}` faulted: {}",
            self.mode, self.event_type, self.bus, self.error
        )
    }
}

/// Invokes handlers and reports their faults. Shared with detached tasks.
pub(crate) struct Reporter {
    bus: Arc<str>,
    hook: Option<FaultHook>,
}

impl Reporter {
    pub(crate) fn new(bus: Arc<str>, hook: Option<FaultHook>) -> Self {
        Self { bus, hook }
    }

    /// Run `handler` on `view`, catching panics. A fault is logged and passed
    /// to the hook before being returned. A panicking hook is logged and
    /// otherwise ignored.
    pub(crate) fn call(&self, handler: &EventHandler, view: &EventView) -> Result<(), Fault> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(view)))
            .unwrap_or_else(|payload| Err(HandlerError::from_panic(payload)));
        let Err(error) = outcome else {
            return Ok(());
        };

        let fault = Fault {
            bus: Arc::clone(&self.bus),
            event_type: handler.event_type(),
            mode: handler.mode(),
            error,
        };
        warn!(
            bus = %fault.bus,
            event_type = %fault.event_type,
            mode = ?fault.mode,
            error = %fault.error,
            "handler faulted"
        );
        if let Some(hook) = &self.hook {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| hook(&fault))) {
                warn!(
                    bus = %fault.bus,
                    event_type = %fault.event_type,
                    error = %HandlerError::from_panic(payload),
                    "fault hook panicked"
                );
            }
        }
        Err(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightbus_core::Event;
    use parking_lot::Mutex;

    struct Ping;
    impl Event for Ping {}

    fn ping() -> EventView {
        EventView::new(Arc::new(Ping))
    }

    #[test]
    fn successful_calls_are_not_reported() {
        let reported = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&reported);
        let hook: FaultHook = Arc::new(move |_| *counter.lock() += 1);
        let reporter = Reporter::new("test".into(), Some(hook));

        let handler = EventHandler::new(|_: &Ping| {});
        assert!(reporter.call(&handler, &ping()).is_ok());
        assert_eq!(*reported.lock(), 0);
    }

    #[test]
    fn panics_become_faults() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let hook: FaultHook = Arc::new(move |fault| {
            *sink.lock() = Some((fault.bus().to_string(), fault.mode()));
        });
        let reporter = Reporter::new("faulty".into(), Some(hook));

        let handler = EventHandler::builder::<Ping>()
            .mode(RoutingMode::BackgroundSerial)
            .action(|_| panic!("boom"));
        let fault = reporter.call(&handler, &ping()).unwrap_err();

        assert!(matches!(fault.error(), HandlerError::Panicked(msg) if msg == "boom"));
        assert_eq!(
            *seen.lock(),
            Some(("faulty".to_string(), RoutingMode::BackgroundSerial))
        );
    }

    #[test]
    fn panicking_hook_does_not_escape() {
        let hook: FaultHook = Arc::new(|_| panic!("hook failed"));
        let reporter = Reporter::new("test".into(), Some(hook));

        let handler = EventHandler::builder::<Ping>().try_action(|_| Err("nope".into()));
        let fault = reporter.call(&handler, &ping()).unwrap_err();
        assert!(matches!(fault.error(), HandlerError::Failed(_)));

        let handler = EventHandler::new(|_: &Ping| {});
        assert!(reporter.call(&handler, &ping()).is_ok());
    }

    #[test]
    fn into_error_names_the_event_type() {
        let reporter = Reporter::new("test".into(), None);
        let handler = EventHandler::builder::<Ping>().try_action(|_| Err("nope".into()));
        let err = reporter.call(&handler, &ping()).unwrap_err().into_error();

        assert!(err.to_string().contains("Ping"));
        assert!(matches!(
            err,
            BusError::Handler {
                source: HandlerError::Failed(_),
                ..
            }
        ));
    }
}
