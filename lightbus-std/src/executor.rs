//! Execution pools for background delivery.
//!
//! Both background posters hand their tasks to an [`Executor`]. Unless a
//! dispatcher is configured with its own, they share one process-wide pool,
//! created lazily on first use. [`set_executor`] replaces it; do that before
//! the first background delivery, since tasks already handed to the old pool
//! keep running there.

use futures::executor::ThreadPool;
use parking_lot::{RwLock, const_rwlock};
use std::{io, sync::Arc, thread};
use tracing::debug;

/// A unit of work submitted to an executor or to the UI thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Minimum number of worker threads in the default pool.
const MIN_POOL_SIZE: usize = 16;

/// Something that runs tasks, usually on other threads.
pub trait Executor: Send + Sync + 'static {
    /// Run `task` at some point. Must not block the caller until it finishes.
    fn execute(&self, task: Task);
}

impl Executor for ThreadPool {
    fn execute(&self, task: Task) {
        self.spawn_ok(async move { task() });
    }
}

/// Runs each task on a `tokio` blocking thread.
#[cfg(feature = "tokio")]
#[derive(Clone, Debug)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioExecutor {
    /// Use the given runtime.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside a `tokio` runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

#[cfg(feature = "tokio")]
impl Executor for TokioExecutor {
    fn execute(&self, task: Task) {
        drop(self.handle.spawn_blocking(task));
    }
}

static SHARED: RwLock<Option<Arc<dyn Executor>>> = const_rwlock(None);

/// Install the process-wide executor used by posters without their own.
pub fn set_executor(executor: Arc<dyn Executor>) {
    *SHARED.write() = Some(executor);
    debug!("installed shared executor");
}

/// The process-wide executor, creating the default pool on first use.
pub fn shared_executor() -> io::Result<Arc<dyn Executor>> {
    if let Some(executor) = SHARED.read().as_ref() {
        return Ok(Arc::clone(executor));
    }

    let mut slot = SHARED.write();
    if let Some(executor) = slot.as_ref() {
        return Ok(Arc::clone(executor));
    }
    let pool = default_pool()?;
    let executor: Arc<dyn Executor> = Arc::new(pool);
    *slot = Some(Arc::clone(&executor));
    Ok(executor)
}

fn default_pool() -> io::Result<ThreadPool> {
    let size = thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
        .max(MIN_POOL_SIZE);
    debug!(size, "creating default executor pool");
    ThreadPool::builder()
        .pool_size(size)
        .name_prefix("lightbus-worker-")
        .create()
}
