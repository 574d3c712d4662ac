//! Routing modes.

/// The execution context a handler's callback is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoutingMode {
    /// Call the handler directly on the posting thread.
    #[default]
    Inline,

    /// Call directly when posting from the UI thread, otherwise submit to the
    /// UI thread.
    Ui,

    /// Always submit to the UI thread, even when already on it. The handler
    /// runs after the UI thread's current call stack unwinds.
    UiOrdered,

    /// When posting from the UI thread, queue on the serial background poster
    /// (one task at a time, strict FIFO). Off the UI thread, call directly.
    BackgroundSerial,

    /// Always queue on the parallel background poster.
    BackgroundParallel,
}
