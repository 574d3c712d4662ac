//! # lightbus - Typed In-Process Event Bus
//!
//! `lightbus` delivers posted values to the handlers registered for their
//! type, ordered by priority, each on the execution context it asked for.
//!
//! ## Quick Start
//!
//! ```rust
//! use lightbus::prelude::*;
//!
//! #[derive(Event)]
//! struct Saved {
//!     id: u32,
//! }
//!
//! let bus = EventBus::get("docs");
//! let audit = EventHandler::builder::<Saved>()
//!     .priority(10)
//!     .action(|saved| println!("audit {}", saved.id));
//! let notify = EventHandler::builder::<Saved>()
//!     .mode(RoutingMode::BackgroundParallel)
//!     .action(|saved| println!("notify {}", saved.id));
//!
//! bus.register(&[audit.clone(), notify.clone()]);
//! bus.post(Saved { id: 1 }).unwrap();
//! bus.unregister(&[audit, notify]);
//! ```
//!
//! # Features
//!
//! - **Routing modes**: inline, UI thread, ordered UI thread, serial and
//!   parallel background delivery ([`RoutingMode`])
//! - **Priorities**: higher first, ties in registration order
//! - **Inheritance**: opt-in delivery to handlers of declared supertypes and
//!   interfaces ([`Lineage`], `#[event(extends(..), implements(..))]`)
//! - **Sticky events**: the latest instance per type is replayed to sticky
//!   handlers as they register
//! - **Reentrancy**: posts made from inside a handler are queued and
//!   delivered in order after the current event
//! - **Channels**: independent buses by name ([`EventBus::get`])
//!
//! ## Cargo features
//!
//! - `macros` (default): `#[derive(Event)]`
//! - `tokio`: [`TokioExecutor`](lightbus_std::TokioExecutor) for running
//!   background delivery on a tokio runtime

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod bus;
mod channel;
mod config;
mod dispatch;
mod fault;
mod hierarchy;
mod registry;
mod sticky;

pub use bus::EventBus;
pub use config::{BusConfig, DEFAULT_PARALLEL_WINDOW};
pub use fault::{Fault, FaultHook, FaultPolicy};

pub use lightbus_core::{
    // Errors
    BoxError,
    BusError,
    // Identity and lineage
    Event,
    // Handlers
    EventHandler,
    EventType,
    EventView,
    HandlerBuilder,
    HandlerError,
    IntoShared,
    Lineage,
    Parents,
    RoutingMode,
    Supertype,
};

pub use lightbus_std::{
    // Execution
    Executor,
    // UI thread
    Looper,
    Poster,
    Task,
    UiQueue,
    UiThread,
    install_ui_thread,
    set_executor,
    ui_thread,
};

#[cfg(feature = "tokio")]
pub use lightbus_std::TokioExecutor;

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use lightbus_std::testing::*;
}

/// Prelude module - common imports for lightbus.
///
/// # Usage
///
/// ```rust
/// use lightbus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, BusConfig, BusError, Event, EventBus, EventHandler, EventType, FaultPolicy,
        Lineage, RoutingMode,
    };
}

#[cfg(feature = "macros")]
pub use lightbus_macros::Event;
