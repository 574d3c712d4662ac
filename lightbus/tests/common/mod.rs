#![allow(dead_code)]

use lightbus::{Event, EventHandler, Lineage, RoutingMode, testing::Recorder};
use std::{sync::Arc, time::Duration};

/// Upper bound for waiting on detached deliveries.
pub const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Test Event Types
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Ping(pub u32);
impl Event for Ping {}

#[derive(Clone, Debug, PartialEq)]
pub struct Pong(pub u32);
impl Event for Pong {}

pub trait Named: Send + Sync {
    fn name(&self) -> &str;
}
impl Event for dyn Named {}

#[derive(Clone, Debug, PartialEq)]
pub struct Parent {
    pub id: u32,
}
impl Event for Parent {}

#[derive(Debug)]
pub struct Son {
    pub parent: Parent,
    pub name: String,
}

impl Son {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            parent: Parent { id },
            name: name.to_string(),
        }
    }
}

impl Named for Son {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Event for Son {
    fn lineage(lineage: &mut Lineage<Self>) {
        lineage
            .implements::<dyn Named>(|son| son)
            .extends::<Parent>(|son| Arc::new(son.parent.clone()));
    }
}

// ============================================================================
// Test Handlers
// ============================================================================

/// A handler for `E` that records `tag` on every delivery.
pub fn tagged<E: Event + ?Sized>(
    log: &Recorder<&'static str>,
    tag: &'static str,
    priority: i32,
) -> EventHandler {
    let log = log.clone();
    EventHandler::builder::<E>()
        .priority(priority)
        .action(move |_| log.push(tag))
}

/// Like [`tagged`] with an explicit routing mode.
pub fn routed<E: Event + ?Sized>(
    log: &Recorder<&'static str>,
    tag: &'static str,
    mode: RoutingMode,
) -> EventHandler {
    let log = log.clone();
    EventHandler::builder::<E>()
        .mode(mode)
        .action(move |_| log.push(tag))
}
