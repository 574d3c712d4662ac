//! Procedural macros for lightbus.

use proc_macro::TokenStream;

mod event;

/// Derive `lightbus::Event`, optionally declaring lineage.
///
/// ```rust,ignore
/// #[derive(Clone, lightbus::Event)]
/// struct Parent;
///
/// #[derive(lightbus::Event)]
/// #[event(implements(dyn Named), extends(Parent, via = parent))]
/// struct Son {
///     parent: Parent,
/// }
/// ```
///
/// - `implements(A, B, ..)`: interface types the event can be viewed as. Each
///   must be reachable from the type by unsizing, e.g. `dyn Trait` for a
///   trait the type implements.
/// - `extends(P, via = field)`: the supertype, shared from the named field.
///   The field must be a `P` that is `Clone`, or an `Arc<P>`.
#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    event::derive_event_impl(input)
}
