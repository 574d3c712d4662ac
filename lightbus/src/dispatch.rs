//! The post and deliver state machine.
//!
//! A post on a thread that is already posting on the same bus is appended to
//! that thread's deferred queue and delivered after the current event, so
//! every handler observes events in the order they were posted. The first
//! post on a thread drains the queue before returning.
//!
//! Per-thread state lives in a thread-local table keyed by bus id. An entry
//! exists exactly while the thread is posting on that bus.

use crate::{
    bus::EventBus,
    fault::FaultPolicy,
    hierarchy,
};
use lightbus_core::{BusError, EventHandler, EventType, EventView, RoutingMode};
use lightbus_std::{Poster, Task};
use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    sync::{Arc, atomic::Ordering},
};
use tracing::{error, trace, warn};

struct Pending {
    view: EventView,
    inheritance: bool,
}

thread_local! {
    static POSTING: RefCell<HashMap<u64, VecDeque<Pending>>> = RefCell::new(HashMap::new());
}

/// Marks the current thread as posting on a bus for its lifetime.
struct PostingGuard<'a> {
    bus: &'a EventBus,
}

impl<'a> PostingGuard<'a> {
    /// Claim the thread for `bus`. Returns `None` if the thread already posts
    /// on it, in which case `pending` was deferred.
    fn enter(bus: &'a EventBus, pending: Pending) -> Option<(Self, Pending)> {
        let first = POSTING.with(|table| {
            let mut table = table.borrow_mut();
            match table.get_mut(&bus.id) {
                Some(queue) => {
                    queue.push_back(pending);
                    None
                }
                None => {
                    table.insert(bus.id, VecDeque::new());
                    Some(pending)
                }
            }
        })?;
        bus.posting.fetch_add(1, Ordering::SeqCst);
        Some((Self { bus }, first))
    }

    fn next(&self) -> Option<Pending> {
        POSTING.with(|table| {
            table
                .borrow_mut()
                .get_mut(&self.bus.id)
                .and_then(VecDeque::pop_front)
        })
    }
}

impl Drop for PostingGuard<'_> {
    fn drop(&mut self) {
        let leftover = POSTING
            .try_with(|table| table.borrow_mut().remove(&self.bus.id))
            .ok()
            .flatten()
            .map_or(0, |queue| queue.len());
        if leftover > 0 {
            warn!(bus = %self.bus.name, discarded = leftover, "discarding deferred events");
        }
        self.bus.posting.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EventBus {
    pub(crate) fn post_view(&self, view: EventView, inheritance: bool) -> Result<(), BusError> {
        let pending = Pending { view, inheritance };
        let Some((guard, first)) = PostingGuard::enter(self, pending) else {
            trace!(bus = %self.name, "deferring post until the current delivery finishes");
            return Ok(());
        };

        let on_ui = self.ui.is_current();
        let mut next = Some(first);
        while let Some(pending) = next {
            self.deliver(&pending, on_ui)?;
            next = guard.next();
        }
        Ok(())
    }

    fn deliver(&self, pending: &Pending, on_ui: bool) -> Result<(), BusError> {
        let root = pending.view.event_type();
        trace!(bus = %self.name, event_type = %root, inheritance = pending.inheritance, "delivering");
        if !pending.inheritance {
            return self.fan_out(root, &pending.view, on_ui);
        }
        for ancestor in hierarchy::closure(root).iter() {
            let Some(view) = ancestor.view(&pending.view) else {
                continue;
            };
            self.fan_out(ancestor.event_type(), &view, on_ui)?;
        }
        Ok(())
    }

    fn fan_out(&self, event_type: EventType, view: &EventView, on_ui: bool) -> Result<(), BusError> {
        let Some(handlers) = self.subscriptions.snapshot(&event_type) else {
            return Ok(());
        };
        trace!(bus = %self.name, %event_type, handlers = handlers.len(), "fan-out");
        for handler in handlers.iter() {
            self.route(handler, view, on_ui)?;
        }
        Ok(())
    }

    /// Run or hand off one handler according to its routing mode.
    pub(crate) fn route(
        &self,
        handler: &EventHandler,
        view: &EventView,
        on_ui: bool,
    ) -> Result<(), BusError> {
        match handler.mode() {
            RoutingMode::Inline => self.invoke(handler, view),
            RoutingMode::Ui if on_ui => self.invoke(handler, view),
            RoutingMode::Ui | RoutingMode::UiOrdered => {
                self.ui.submit(self.detached(handler, view));
                Ok(())
            }
            RoutingMode::BackgroundSerial if on_ui => self.enqueue(&self.serial, handler, view),
            RoutingMode::BackgroundSerial => self.invoke(handler, view),
            RoutingMode::BackgroundParallel => self.enqueue(&self.parallel, handler, view),
        }
    }

    fn invoke(&self, handler: &EventHandler, view: &EventView) -> Result<(), BusError> {
        match self.reporter.call(handler, view) {
            Ok(()) => Ok(()),
            Err(fault) => match self.config.fault_policy {
                FaultPolicy::Isolate => Ok(()),
                FaultPolicy::Propagate => Err(fault.into_error()),
            },
        }
    }

    fn detached(&self, handler: &EventHandler, view: &EventView) -> Task {
        let handler = handler.clone();
        let view = view.clone();
        let reporter = Arc::clone(&self.reporter);
        Box::new(move || {
            // Already logged and hooked.
            let _ = reporter.call(&handler, &view);
        })
    }

    fn enqueue(&self, poster: &Poster, handler: &EventHandler, view: &EventView) -> Result<(), BusError> {
        let Err(err) = poster.enqueue(self.detached(handler, view)) else {
            return Ok(());
        };
        error!(bus = %self.name, event_type = %handler.event_type(), %err, "background delivery unavailable");
        match self.config.fault_policy {
            FaultPolicy::Isolate => Ok(()),
            FaultPolicy::Propagate => Err(BusError::Executor(err)),
        }
    }
}
