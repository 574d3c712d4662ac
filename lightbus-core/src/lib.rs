//! # lightbus-core
//!
//! Core types for the lightbus typed event dispatcher.
//!
//! This crate has minimal dependencies and holds everything a producer or a
//! subscriber needs to describe events and handlers, without pulling in the
//! dispatcher runtime from `lightbus`.
//!
//! # Pieces
//!
//! ## Event identity ([`Event`], [`EventType`])
//!
//! Every event type implements [`Event`]. The trait is implemented for
//! concrete structs (the values that get posted) and for interface types such
//! as `dyn Named` (types that handlers can subscribe to but that are never
//! posted directly). [`EventType`] is the runtime identity used as a map key.
//!
//! ## Lineage ([`Lineage`])
//!
//! An event type declares the interfaces it implements and the supertype it
//! extends in [`Event::lineage`]. Each link carries a cast so the dispatcher
//! can hand the event to a handler registered for any ancestor.
//!
//! ## Registration ([`EventHandler`], [`RoutingMode`])
//!
//! A handler is an immutable record of event type, routing mode, sticky flag,
//! priority and a type-erased callback. Clones share identity; unregistering
//! any clone removes the subscription.
//!
//! # Error Types
//!
//! - [`BusError`] - Top-level error type
//! - [`HandlerError`] - A single handler's fault

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod event;
mod handler;
mod mode;

// Re-exports
pub use error::{BoxError, BusError, HandlerError};
pub use event::{Event, EventType, EventView, IntoShared, Lineage, Parents, Supertype};
pub use handler::{EventHandler, HandlerBuilder};
pub use mode::RoutingMode;
