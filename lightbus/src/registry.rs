//! Subscription registry.
//!
//! Maps each event type to its handlers, ordered by descending priority with
//! ties in registration order. Lists are shared as `Arc<Vec<_>>`: a post
//! clones the `Arc` under a momentary lock and iterates without it, so
//! structural changes made while any thread is posting replace the list with
//! a modified copy instead of touching the one being iterated.

use lightbus_core::{EventHandler, EventType};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

pub(crate) type HandlerList = Arc<Vec<EventHandler>>;

#[derive(Default)]
pub(crate) struct Subscriptions {
    map: Mutex<HashMap<EventType, HandlerList>>,
}

impl Subscriptions {
    /// The current list for `event_type`.
    pub(crate) fn snapshot(&self, event_type: &EventType) -> Option<HandlerList> {
        self.map.lock().get(event_type).cloned()
    }

    /// Number of handlers registered for exactly `event_type`.
    pub(crate) fn count(&self, event_type: &EventType) -> usize {
        self.map.lock().get(event_type).map_or(0, |list| list.len())
    }

    /// Insert each handler at its priority position. `posting` is the number
    /// of threads currently delivering on the owning bus.
    pub(crate) fn insert_all(&self, handlers: &[EventHandler], posting: &AtomicUsize) {
        let mut map = self.map.lock();
        for handler in handlers {
            let list = map.entry(handler.event_type()).or_default();
            if posting.load(Ordering::SeqCst) == 0 {
                insert_by_priority(Arc::make_mut(list), handler.clone());
            } else {
                let mut copy = Vec::clone(list);
                insert_by_priority(&mut copy, handler.clone());
                *list = Arc::new(copy);
            }
        }
    }

    /// Remove the first identity match of each handler. Returns how many
    /// were found.
    pub(crate) fn remove_all(&self, handlers: &[EventHandler], posting: &AtomicUsize) -> usize {
        let mut map = self.map.lock();
        let mut removed = 0;
        for handler in handlers {
            let event_type = handler.event_type();
            let Some(list) = map.get_mut(&event_type) else {
                continue;
            };
            let Some(index) = list.iter().position(|h| h == handler) else {
                continue;
            };
            if list.len() == 1 {
                map.remove(&event_type);
            } else if posting.load(Ordering::SeqCst) == 0 {
                Arc::make_mut(list).remove(index);
            } else {
                let mut copy = Vec::clone(list);
                copy.remove(index);
                *list = Arc::new(copy);
            }
            removed += 1;
        }
        removed
    }
}

/// Keep `list` in non-increasing priority order; a new handler goes after
/// every existing handler of equal priority.
fn insert_by_priority(list: &mut Vec<EventHandler>, handler: EventHandler) {
    let priority = handler.priority();
    match list.last() {
        None => list.push(handler),
        Some(last) if priority <= last.priority() => list.push(handler),
        Some(_) => {
            let index = list.partition_point(|existing| existing.priority() >= priority);
            list.insert(index, handler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightbus_core::Event;

    struct Tick;
    impl Event for Tick {}

    struct Tock;
    impl Event for Tock {}

    fn handler(priority: i32) -> EventHandler {
        EventHandler::builder::<Tick>().priority(priority).action(|_| {})
    }

    fn priorities(list: &[EventHandler]) -> Vec<i32> {
        list.iter().map(EventHandler::priority).collect()
    }

    #[test]
    fn insertion_orders_by_descending_priority() {
        let mut list = Vec::new();
        for p in [1, 3, 2, -1, 5, 0] {
            insert_by_priority(&mut list, handler(p));
        }
        assert_eq!(priorities(&list), vec![5, 3, 2, 1, 0, -1]);
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let first = handler(1);
        let second = handler(1);
        let high = handler(2);
        let third = handler(1);

        let mut list = Vec::new();
        for h in [&first, &second, &high, &third] {
            insert_by_priority(&mut list, h.clone());
        }

        assert_eq!(list, vec![high, first, second, third]);
    }

    #[test]
    fn snapshots_are_not_torn_by_later_changes() {
        let subs = Subscriptions::default();
        let posting = AtomicUsize::new(0);
        let a = handler(1);
        subs.insert_all(&[a.clone()], &posting);

        let before = subs.snapshot(&EventType::of::<Tick>()).unwrap();

        // Idle path: make_mut must still copy because `before` is shared.
        let b = handler(2);
        subs.insert_all(&[b.clone()], &posting);
        assert_eq!(*before, vec![a.clone()]);

        // Posting path: always a fresh copy.
        posting.store(1, Ordering::SeqCst);
        let during = subs.snapshot(&EventType::of::<Tick>()).unwrap();
        subs.remove_all(&[a.clone()], &posting);
        assert_eq!(*during, vec![b.clone(), a]);
        assert_eq!(*subs.snapshot(&EventType::of::<Tick>()).unwrap(), vec![b]);
    }

    #[test]
    fn removing_the_last_handler_drops_the_entry() {
        let subs = Subscriptions::default();
        let posting = AtomicUsize::new(0);
        let only = handler(0);
        subs.insert_all(&[only.clone()], &posting);
        assert_eq!(subs.count(&EventType::of::<Tick>()), 1);

        assert_eq!(subs.remove_all(&[only], &posting), 1);
        assert!(subs.snapshot(&EventType::of::<Tick>()).is_none());
    }

    #[test]
    fn removing_unknown_handlers_is_a_no_op() {
        let subs = Subscriptions::default();
        let posting = AtomicUsize::new(0);
        let registered = handler(0);
        subs.insert_all(&[registered.clone()], &posting);

        let stranger = handler(0);
        let other_type = EventHandler::new(|_: &Tock| {});
        assert_eq!(subs.remove_all(&[stranger, other_type], &posting), 0);
        assert_eq!(subs.count(&EventType::of::<Tick>()), 1);
    }

    #[test]
    fn only_one_copy_of_a_duplicate_is_removed() {
        let subs = Subscriptions::default();
        let posting = AtomicUsize::new(0);
        let twice = handler(0);
        subs.insert_all(&[twice.clone(), twice.clone()], &posting);
        assert_eq!(subs.count(&EventType::of::<Tick>()), 2);

        subs.remove_all(&[twice.clone()], &posting);
        assert_eq!(subs.count(&EventType::of::<Tick>()), 1);
        subs.remove_all(&[twice], &posting);
        assert_eq!(subs.count(&EventType::of::<Tick>()), 0);
    }
}
