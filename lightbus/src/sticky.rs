//! Most recent instance per event type, for replay to late subscribers.

use dashmap::DashMap;
use lightbus_core::{EventType, EventView};

#[derive(Default)]
pub(crate) struct StickyEvents {
    events: DashMap<EventType, EventView>,
}

impl StickyEvents {
    /// Store `view` under its own type, replacing any previous instance.
    pub(crate) fn insert(&self, view: EventView) {
        self.events.insert(view.event_type(), view);
    }

    pub(crate) fn get(&self, event_type: &EventType) -> Option<EventView> {
        self.events.get(event_type).map(|entry| entry.value().clone())
    }

    pub(crate) fn remove(&self, event_type: &EventType) -> Option<EventView> {
        self.events.remove(event_type).map(|(_, view)| view)
    }

    pub(crate) fn contains(&self, event_type: &EventType) -> bool {
        self.events.contains_key(event_type)
    }

    pub(crate) fn clear(&self) {
        self.events.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
