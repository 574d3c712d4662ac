//! The dispatcher instance.

use crate::{
    config::BusConfig,
    fault::Reporter,
    registry::Subscriptions,
    sticky::StickyEvents,
};
use lightbus_core::{BusError, Event, EventHandler, EventType, EventView};
use lightbus_std::{Executor, Poster, UiThread};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};
use tracing::{debug, trace};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// An isolated publish/subscribe namespace.
///
/// Handlers are registered with [`register`](Self::register) and receive
/// every event posted afterwards whose type matches theirs, highest priority
/// first. Where a callback runs is chosen per handler by its
/// [`RoutingMode`](lightbus_core::RoutingMode).
///
/// # Example
///
/// ```rust
/// use lightbus::{Event, EventBus, EventHandler};
/// use std::sync::{Arc, Mutex};
///
/// struct Saved(u32);
/// impl Event for Saved {}
///
/// let bus = EventBus::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// bus.register(&[EventHandler::new(move |saved: &Saved| {
///     sink.lock().unwrap().push(saved.0);
/// })]);
///
/// bus.post(Saved(7)).unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![7]);
/// ```
pub struct EventBus {
    pub(crate) id: u64,
    pub(crate) name: Arc<str>,
    pub(crate) config: BusConfig,
    pub(crate) subscriptions: Subscriptions,
    pub(crate) sticky: StickyEvents,
    /// Threads currently delivering on this bus.
    pub(crate) posting: AtomicUsize,
    pub(crate) serial: Poster,
    pub(crate) parallel: Poster,
    pub(crate) ui: Arc<dyn UiThread>,
    pub(crate) reporter: Arc<Reporter>,
}

impl EventBus {
    /// A standalone bus with default settings.
    ///
    /// Most applications share [`EventBus::get_default`] or a named channel
    /// from [`EventBus::get`] instead.
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// A standalone bus with the given settings.
    pub fn with_config(config: BusConfig) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let name: Arc<str> = match &config.name {
            Some(name) => name.as_str().into(),
            None => format!("bus-{id}").into(),
        };
        let (serial, parallel) = match &config.executor {
            Some(executor) => (
                Poster::with_executor(1, Arc::clone(executor)),
                Poster::with_executor(config.parallel_window, Arc::clone(executor)),
            ),
            None => (Poster::new(1), Poster::new(config.parallel_window)),
        };
        let ui = config
            .ui_thread
            .clone()
            .unwrap_or_else(lightbus_std::ui_thread);
        let reporter = Arc::new(Reporter::new(Arc::clone(&name), config.on_fault.clone()));
        debug!(bus = %name, ?config, "created bus");

        Self {
            id,
            name,
            config,
            subscriptions: Subscriptions::default(),
            sticky: StickyEvents::default(),
            posting: AtomicUsize::new(0),
            serial,
            parallel,
            ui,
            reporter,
        }
    }

    /// The bus's label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The settings this bus was built with.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Subscribe `handlers`.
    ///
    /// Each sticky handler whose type has a stored sticky event receives it,
    /// routed by its mode, before this returns. Faults during that replay are
    /// reported but never returned.
    pub fn register(&self, handlers: &[EventHandler]) {
        self.subscriptions.insert_all(handlers, &self.posting);
        debug!(bus = %self.name, count = handlers.len(), "registered handlers");

        if self.sticky.is_empty() {
            return;
        }
        let on_ui = self.ui.is_current();
        for handler in handlers.iter().filter(|handler| handler.is_sticky()) {
            let Some(view) = self.sticky.get(&handler.event_type()) else {
                continue;
            };
            trace!(bus = %self.name, event_type = %handler.event_type(), "replaying sticky event");
            if let Err(err) = self.route(handler, &view, on_ui) {
                debug!(bus = %self.name, %err, "sticky replay fault not propagated");
            }
        }
    }

    /// Unsubscribe `handlers`. Handlers that are not registered are ignored.
    pub fn unregister(&self, handlers: &[EventHandler]) {
        let removed = self.subscriptions.remove_all(handlers, &self.posting);
        debug!(bus = %self.name, removed, requested = handlers.len(), "unregistered handlers");
    }

    // ------------------------------------------------------------------------
    // Posting
    // ------------------------------------------------------------------------

    /// Deliver `event` to its subscribers, including those of its ancestor
    /// types when the bus is configured with event inheritance.
    ///
    /// Returns an error only under [`FaultPolicy::Propagate`](crate::FaultPolicy::Propagate).
    pub fn post<E: Event>(&self, event: E) -> Result<(), BusError> {
        self.post_with(event, self.config.event_inheritance)
    }

    /// Deliver `event`, choosing explicitly whether ancestor types are
    /// included.
    pub fn post_with<E: Event>(&self, event: E, inheritance: bool) -> Result<(), BusError> {
        self.post_view(EventView::new(Arc::new(event)), inheritance)
    }

    /// Store `event` as the sticky instance of its type, then post it.
    pub fn post_sticky<E: Event>(&self, event: E) -> Result<(), BusError> {
        let view = EventView::new(Arc::new(event));
        self.sticky.insert(view.clone());
        self.post_view(view, self.config.event_inheritance)
    }

    // ------------------------------------------------------------------------
    // Sticky events
    // ------------------------------------------------------------------------

    /// Drop the sticky instance of `event_type`. Returns whether one existed.
    pub fn remove_sticky_event(&self, event_type: EventType) -> bool {
        self.sticky.remove(&event_type).is_some()
    }

    /// Whether a sticky instance of `event_type` is stored.
    pub fn has_sticky_event(&self, event_type: EventType) -> bool {
        self.sticky.contains(&event_type)
    }

    /// Drop every sticky instance.
    pub fn remove_all_sticky_events(&self) {
        self.sticky.clear();
    }

    /// The stored sticky instance of `E`.
    pub fn sticky_event<E: Event>(&self) -> Option<Arc<E>> {
        self.sticky
            .get(&EventType::of::<E>())
            .and_then(|view| view.downcast::<E>().cloned())
    }

    /// Remove and return the sticky instance of `E`.
    pub fn remove_sticky<E: Event>(&self) -> Option<Arc<E>> {
        self.sticky
            .remove(&EventType::of::<E>())
            .and_then(|view| view.downcast::<E>().cloned())
    }

    /// Whether a sticky instance of `E` is stored.
    pub fn has_sticky<E: Event>(&self) -> bool {
        self.has_sticky_event(EventType::of::<E>())
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Whether any handler is registered for exactly `E`.
    pub fn has_subscriber_for<E: Event + ?Sized>(&self) -> bool {
        self.subscriber_count(EventType::of::<E>()) > 0
    }

    /// Number of handlers registered for exactly `event_type`.
    pub fn subscriber_count(&self, event_type: EventType) -> usize {
        self.subscriptions.count(&event_type)
    }

    /// Whether any thread is currently delivering on this bus.
    pub fn is_posting(&self) -> bool {
        self.posting.load(Ordering::SeqCst) > 0
    }

    /// Replace the process-wide pool used by background delivery.
    ///
    /// Affects every bus without its own executor. Call it before the first
    /// background delivery.
    pub fn set_executor(&self, executor: Arc<dyn Executor>) {
        lightbus_std::set_executor(executor);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.name)
            .field("posting", &self.posting.load(Ordering::Relaxed))
            .field("serial", &self.serial)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}
