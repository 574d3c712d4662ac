//! Per-bus configuration.

use crate::fault::{Fault, FaultHook, FaultPolicy};
use lightbus_std::{Executor, UiThread};
use std::{fmt, sync::Arc};

/// Window of the parallel background poster unless configured otherwise.
pub const DEFAULT_PARALLEL_WINDOW: usize = 8;

/// Settings for an [`EventBus`](crate::EventBus).
///
/// # Example
///
/// ```rust
/// use lightbus::{BusConfig, EventBus, FaultPolicy};
///
/// let bus = EventBus::with_config(
///     BusConfig::new()
///         .with_name("orders")
///         .with_event_inheritance(true)
///         .with_fault_policy(FaultPolicy::Propagate),
/// );
/// assert_eq!(bus.name(), "orders");
/// ```
#[derive(Clone)]
pub struct BusConfig {
    pub(crate) name: Option<String>,
    pub(crate) event_inheritance: bool,
    pub(crate) parallel_window: usize,
    pub(crate) fault_policy: FaultPolicy,
    pub(crate) ui_thread: Option<Arc<dyn UiThread>>,
    pub(crate) executor: Option<Arc<dyn Executor>>,
    pub(crate) on_fault: Option<FaultHook>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: None,
            event_inheritance: false,
            parallel_window: DEFAULT_PARALLEL_WINDOW,
            fault_policy: FaultPolicy::default(),
            ui_thread: None,
            executor: None,
            on_fault: None,
        }
    }
}

impl BusConfig {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Label used in logs and faults.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether [`EventBus::post`](crate::EventBus::post) delivers to ancestor
    /// types as well.
    pub fn with_event_inheritance(mut self, enabled: bool) -> Self {
        self.event_inheritance = enabled;
        self
    }

    /// How many parallel background handlers may run at once.
    pub fn with_parallel_window(mut self, window: usize) -> Self {
        self.parallel_window = window;
        self
    }

    /// What to do when a handler on the posting thread faults.
    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    /// UI thread used instead of the process default.
    pub fn with_ui_thread(mut self, ui: Arc<dyn UiThread>) -> Self {
        self.ui_thread = Some(ui);
        self
    }

    /// Executor for both background posters instead of the shared pool.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Called with every handler fault, wherever the handler ran.
    pub fn with_fault_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Fault) + Send + Sync + 'static,
    {
        self.on_fault = Some(Arc::new(hook));
        self
    }

    /// The default for [`EventBus::post`](crate::EventBus::post).
    pub fn event_inheritance(&self) -> bool {
        self.event_inheritance
    }

    /// Window of the parallel background poster.
    pub fn parallel_window(&self) -> usize {
        self.parallel_window
    }

    /// The configured fault policy.
    pub fn fault_policy(&self) -> FaultPolicy {
        self.fault_policy
    }
}

impl fmt::Debug for BusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusConfig")
            .field("name", &self.name)
            .field("event_inheritance", &self.event_inheritance)
            .field("parallel_window", &self.parallel_window)
            .field("fault_policy", &self.fault_policy)
            .field("ui_thread", &self.ui_thread.is_some())
            .field("executor", &self.executor.is_some())
            .field("on_fault", &self.on_fault.is_some())
            .finish()
    }
}
