//! # Handler registration
//!
//! An [`EventHandler`] is the unit of subscription: the event type it listens
//! to, how its callback is routed, whether it wants the sticky instance on
//! registration, its priority, and the callback itself.
//!
//! Handlers are immutable once built. They are compared by identity: a clone
//! refers to the same subscription, while two handlers built separately with
//! identical settings are different subscriptions.
//!
//! # Usage Patterns
//!
//! 1. **Defaults**: `EventHandler::new(|event: &Saved| { ... })`
//! 2. **Configured**: `EventHandler::builder::<Saved>().priority(10).action(...)`
//! 3. **Fallible**: `EventHandler::builder::<Saved>().try_action(|event| { ...; Ok(()) })`

use crate::{
    error::{BoxError, HandlerError},
    event::{Event, EventType, EventView},
    mode::RoutingMode,
};
use std::{fmt, marker::PhantomData, sync::Arc};

type Action = dyn Fn(&EventView) -> Result<(), HandlerError> + Send + Sync;

struct Registration {
    event_type: EventType,
    mode: RoutingMode,
    sticky: bool,
    priority: i32,
    action: Box<Action>,
}

/// One subscription: event type, routing mode, sticky flag, priority and
/// callback.
#[derive(Clone)]
pub struct EventHandler {
    inner: Arc<Registration>,
}

impl EventHandler {
    /// A handler with default settings: inline routing, not sticky,
    /// priority 0.
    pub fn new<E, F>(action: F) -> Self
    where
        E: Event + ?Sized,
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self::builder::<E>().action(action)
    }

    /// Start configuring a handler for events of type `E`.
    pub fn builder<E: Event + ?Sized>() -> HandlerBuilder<E> {
        HandlerBuilder::new()
    }

    /// The event type this handler is registered for.
    pub fn event_type(&self) -> EventType {
        self.inner.event_type
    }

    /// Where the callback runs.
    pub fn mode(&self) -> RoutingMode {
        self.inner.mode
    }

    /// Whether the handler receives the stored sticky event on registration.
    pub fn is_sticky(&self) -> bool {
        self.inner.sticky
    }

    /// Higher priorities are delivered first.
    pub fn priority(&self) -> i32 {
        self.inner.priority
    }

    /// Run the callback on `view`, on the current thread.
    pub fn invoke(&self, view: &EventView) -> Result<(), HandlerError> {
        (self.inner.action)(view)
    }

    /// Whether both values refer to the same subscription.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EventHandler {}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("event_type", &self.inner.event_type)
            .field("mode", &self.inner.mode)
            .field("sticky", &self.inner.sticky)
            .field("priority", &self.inner.priority)
            .finish_non_exhaustive()
    }
}

/// Builder for [`EventHandler`].
pub struct HandlerBuilder<E: ?Sized> {
    mode: RoutingMode,
    sticky: bool,
    priority: i32,
    _event: PhantomData<fn(&E)>,
}

impl<E: Event + ?Sized> HandlerBuilder<E> {
    fn new() -> Self {
        Self {
            mode: RoutingMode::Inline,
            sticky: false,
            priority: 0,
            _event: PhantomData,
        }
    }

    /// Set the routing mode.
    pub fn mode(mut self, mode: RoutingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Receive the stored sticky event, if any, when registered.
    pub fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    /// Set priority. Higher runs first; equal priorities run in
    /// registration order.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Finish with an infallible callback.
    pub fn action<F>(self, action: F) -> EventHandler
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.try_action(move |event| {
            action(event);
            Ok(())
        })
    }

    /// Finish with a fallible callback. Errors are reported as handler faults.
    pub fn try_action<F>(self, action: F) -> EventHandler
    where
        F: Fn(&E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let erased = move |view: &EventView| match view.downcast::<E>() {
            Some(event) => action(event.as_ref()).map_err(HandlerError::Failed),
            None => Err(HandlerError::TypeMismatch {
                expected: std::any::type_name::<E>(),
            }),
        };
        EventHandler {
            inner: Arc::new(Registration {
                event_type: EventType::of::<E>(),
                mode: self.mode,
                sticky: self.sticky,
                priority: self.priority,
                action: Box::new(erased),
            }),
        }
    }
}
