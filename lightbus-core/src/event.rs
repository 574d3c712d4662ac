//! Event identity and lineage.
//!
//! Rust has no runtime class hierarchy, so an event type spells out its
//! ancestry once, in [`Event::lineage`]. The dispatcher walks these
//! declarations to build the closure used for inheritance-based delivery.
//!
//! # Example
//!
//! ```rust
//! use lightbus_core::{Event, EventType, Lineage};
//! use std::sync::Arc;
//!
//! pub trait Named: Send + Sync {
//!     fn name(&self) -> &str;
//! }
//! impl Event for dyn Named {}
//!
//! #[derive(Clone)]
//! struct Parent;
//! impl Event for Parent {}
//!
//! struct Son {
//!     parent: Parent,
//! }
//!
//! impl Named for Son {
//!     fn name(&self) -> &str {
//!         "son"
//!     }
//! }
//!
//! impl Event for Son {
//!     fn lineage(lineage: &mut Lineage<Self>) {
//!         lineage
//!             .implements::<dyn Named>(|son| son)
//!             .extends::<Parent>(|son| Arc::new(son.parent.clone()));
//!     }
//! }
//!
//! let parents = EventType::of::<Son>().parents();
//! assert_eq!(parents.interfaces()[0].event_type(), EventType::of::<dyn Named>());
//! ```

use std::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    sync::Arc,
};

/// A type that can be posted to, or subscribed on, an event bus.
///
/// Implement it for the structs you post, and for interface types
/// (`dyn Trait`) that handlers should be able to subscribe to. Only `Sized`
/// implementors can be posted.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Event",
    label = "must implement `Event`",
    note = "Events must be `Send + Sync + 'static`; derive or implement `Event` for the type."
)]
pub trait Event: Send + Sync + 'static {
    /// Declare the interfaces this type implements and the supertype it
    /// extends. The default declares nothing.
    fn lineage(lineage: &mut Lineage<Self>) {
        let _ = lineage;
    }
}

// Common Event implementations
impl Event for () {}
impl Event for String {}
impl Event for &'static str {}
impl<T: Event> Event for Vec<T> {}
impl<T: Event> Event for Option<T> {}

/// Runtime identity of an event type.
///
/// Two `EventType`s are equal when they describe the same Rust type.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
    parents: fn() -> Parents,
}

impl EventType {
    /// The identity of `E`.
    pub fn of<E: Event + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
            parents: Parents::of::<E>,
        }
    }

    /// The underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The Rust type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The direct interfaces and supertype this type declares.
    pub fn parents(&self) -> Parents {
        (self.parents)()
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A shared, type-erased event, viewed as one particular type.
///
/// A view of type `T` holds an `Arc<T>`; `T` may be unsized (`dyn Named`).
#[derive(Clone)]
pub struct EventView {
    inner: Arc<dyn Any + Send + Sync>,
    event_type: EventType,
}

impl EventView {
    /// Wrap a shared event.
    pub fn new<E: Event + ?Sized>(event: Arc<E>) -> Self {
        Self {
            inner: Arc::new(event),
            event_type: EventType::of::<E>(),
        }
    }

    /// The type this view presents the event as.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Borrow the event as `E`, if this view holds an `E`.
    pub fn downcast<E: Event + ?Sized>(&self) -> Option<&Arc<E>> {
        self.inner.downcast_ref::<Arc<E>>()
    }
}

impl fmt::Debug for EventView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventView")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

type Cast = Arc<dyn Fn(&EventView) -> Option<EventView> + Send + Sync>;

/// A link from a type to one of its ancestors, with the cast between them.
#[derive(Clone)]
pub struct Supertype {
    event_type: EventType,
    cast: Cast,
}

impl Supertype {
    fn new<E, S>(cast: fn(Arc<E>) -> Arc<S>) -> Self
    where
        E: Event + ?Sized,
        S: Event + ?Sized,
    {
        Self {
            event_type: EventType::of::<S>(),
            cast: Arc::new(move |view: &EventView| {
                view.downcast::<E>()
                    .map(|event| EventView::new(cast(Arc::clone(event))))
            }),
        }
    }

    /// The ancestor's identity.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// View `view` as the ancestor. Returns `None` when `view` does not hold
    /// the type this link starts from.
    pub fn cast(&self, view: &EventView) -> Option<EventView> {
        (self.cast)(view)
    }

    /// Chain this link with a link starting at this link's ancestor.
    pub fn then(&self, next: &Supertype) -> Supertype {
        let first = Arc::clone(&self.cast);
        let second = Arc::clone(&next.cast);
        Supertype {
            event_type: next.event_type,
            cast: Arc::new(move |view: &EventView| first(view).and_then(|mid| second(&mid))),
        }
    }
}

impl fmt::Debug for Supertype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Supertype").field(&self.event_type).finish()
    }
}

/// The erased, direct ancestry of one type.
#[derive(Clone, Debug, Default)]
pub struct Parents {
    interfaces: Vec<Supertype>,
    superclass: Option<Supertype>,
}

impl Parents {
    fn of<E: Event + ?Sized>() -> Parents {
        let mut lineage = Lineage::<E>::new();
        E::lineage(&mut lineage);
        Parents {
            interfaces: lineage.interfaces,
            superclass: lineage.superclass,
        }
    }

    /// Directly implemented interfaces, in declaration order.
    pub fn interfaces(&self) -> &[Supertype] {
        &self.interfaces
    }

    /// The directly extended supertype, if any.
    pub fn superclass(&self) -> Option<&Supertype> {
        self.superclass.as_ref()
    }
}

/// Typed builder passed to [`Event::lineage`].
pub struct Lineage<E: ?Sized> {
    interfaces: Vec<Supertype>,
    superclass: Option<Supertype>,
    _event: PhantomData<fn(Arc<E>)>,
}

impl<E: Event + ?Sized> Lineage<E> {
    fn new() -> Self {
        Self {
            interfaces: Vec::new(),
            superclass: None,
            _event: PhantomData,
        }
    }

    /// Declare that `E` implements the interface type `I`.
    ///
    /// For a trait object `I`, the cast is usually the unsizing coercion
    /// `|event| event`.
    pub fn implements<I: Event + ?Sized>(&mut self, cast: fn(Arc<E>) -> Arc<I>) -> &mut Self {
        self.interfaces.push(Supertype::new(cast));
        self
    }

    /// Declare that `E` extends `P`. A later call replaces an earlier one.
    ///
    /// Only the supertype chain of a posted type is walked. From an interface
    /// type (`dyn Trait`) inheritance delivery follows `implements` links
    /// alone, so declare an interface's parents with
    /// [`implements`](Self::implements).
    pub fn extends<P: Event + ?Sized>(&mut self, cast: fn(Arc<E>) -> Arc<P>) -> &mut Self {
        self.superclass = Some(Supertype::new(cast));
        self
    }
}

/// Produce a shared handle from a field, either by cloning the value or by
/// cloning an existing `Arc`.
///
/// Used by lineage casts that expose an embedded supertype.
pub trait IntoShared<T: ?Sized> {
    /// Share `self` as an `Arc<T>`.
    fn into_shared(&self) -> Arc<T>;
}

impl<T: Clone> IntoShared<T> for T {
    fn into_shared(&self) -> Arc<T> {
        Arc::new(self.clone())
    }
}

impl<T: ?Sized> IntoShared<T> for Arc<T> {
    fn into_shared(&self) -> Arc<T> {
        Arc::clone(self)
    }
}
