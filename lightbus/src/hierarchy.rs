//! Inheritance closure of event types.
//!
//! For a concrete type the closure is: the type itself, then its interfaces
//! (depth first, each followed by the interfaces it extends), then its
//! supertype with that supertype's interfaces, and so on up the chain. A type
//! appears at most once. Each entry keeps the composed cast from the root, so
//! a posted event can be viewed as any of its ancestors.
//!
//! Closures are computed once per type and cached for the process lifetime.

use lightbus_core::{EventType, EventView, Supertype};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};

static CLOSURES: LazyLock<RwLock<HashMap<EventType, Arc<[Ancestor]>>>> =
    LazyLock::new(Default::default);

/// One type of a closure.
#[derive(Clone, Debug)]
pub(crate) struct Ancestor {
    event_type: EventType,
    /// Cast from the root; `None` for the root itself.
    link: Option<Supertype>,
}

impl Ancestor {
    fn root(event_type: EventType) -> Self {
        Self {
            event_type,
            link: None,
        }
    }

    pub(crate) fn event_type(&self) -> EventType {
        self.event_type
    }

    /// View an event of the root type as this ancestor.
    pub(crate) fn view(&self, root: &EventView) -> Option<EventView> {
        match &self.link {
            None => Some(root.clone()),
            Some(link) => link.cast(root),
        }
    }

    fn extend(&self, next: &Supertype) -> Self {
        let link = match &self.link {
            None => next.clone(),
            Some(link) => link.then(next),
        };
        Self {
            event_type: next.event_type(),
            link: Some(link),
        }
    }
}

/// The cached closure of `root`, most-derived first.
pub(crate) fn closure(root: EventType) -> Arc<[Ancestor]> {
    if let Some(types) = CLOSURES.read().get(&root) {
        return Arc::clone(types);
    }
    let resolved: Arc<[Ancestor]> = resolve(root).into();
    Arc::clone(CLOSURES.write().entry(root).or_insert(resolved))
}

fn resolve(root: EventType) -> Vec<Ancestor> {
    let mut types = Vec::new();
    // Supertype chain walked so far; only a repeat here is a cycle.
    let mut chain = Vec::new();
    let mut current = Some(Ancestor::root(root));
    while let Some(class) = current.take() {
        if chain.contains(&class.event_type) {
            break;
        }
        chain.push(class.event_type);
        let parents = class.event_type.parents();
        if !contains(&types, class.event_type) {
            types.push(class.clone());
        }
        add_interfaces(&mut types, &class, parents.interfaces());
        current = parents.superclass().map(|superclass| class.extend(superclass));
    }
    types
}

/// Add `interfaces` of `from` depth first. Only `implements` links are
/// followed from an interface.
fn add_interfaces(types: &mut Vec<Ancestor>, from: &Ancestor, interfaces: &[Supertype]) {
    for interface in interfaces {
        if contains(types, interface.event_type()) {
            continue;
        }
        let ancestor = from.extend(interface);
        types.push(ancestor.clone());
        add_interfaces(types, &ancestor, ancestor.event_type.parents().interfaces());
    }
}

fn contains(types: &[Ancestor], event_type: EventType) -> bool {
    types.iter().any(|ancestor| ancestor.event_type == event_type)
}
