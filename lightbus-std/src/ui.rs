//! The UI-thread seam.
//!
//! The dispatcher never owns a UI toolkit. It only needs to know whether the
//! current thread is the UI thread, and a way to queue a callback onto it.
//! Both are captured by [`UiThread`].
//!
//! Two implementations ship here:
//!
//! | Type | UI thread | Who runs the tasks |
//! |------|-----------|--------------------|
//! | [`Looper`] | a dedicated, lazily spawned thread | the looper thread itself |
//! | [`UiQueue`] | the thread that created it | the host, via `run_pending` |
//!
//! Buses without an explicit UI thread use the process default returned by
//! [`ui_thread`], a [`Looper`] named `lightbus-ui` unless
//! [`install_ui_thread`] installed something else first.

use crate::executor::Task;
use lightbus_core::HandlerError;
use parking_lot::{Condvar, Mutex};
use std::{
    collections::VecDeque,
    fmt, io,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, OnceLock, mpsc},
    thread::{self, ThreadId},
    time::{Duration, Instant},
};
use tracing::{debug, error, warn};

/// Submission primitive of a UI thread.
///
/// Submitted tasks run later, on the UI thread, in submission order. Nothing
/// is reported back to the submitter.
pub trait UiThread: Send + Sync + 'static {
    /// Whether the calling thread is the UI thread.
    fn is_current(&self) -> bool;

    /// Queue `task` to run on the UI thread.
    fn submit(&self, task: Task);
}

fn run_guarded(task: Task) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
        let err = HandlerError::from_panic(payload);
        warn!(%err, "ui task panicked");
    }
}

// ============================================================================
// Looper
// ============================================================================

/// A dedicated thread acting as the UI thread.
///
/// The thread is spawned on first submission (or by [`Looper::start`]) and
/// exits when the looper is dropped.
pub struct Looper {
    name: String,
    worker: OnceLock<Option<Worker>>,
}

struct Worker {
    sender: mpsc::Sender<Task>,
    thread: ThreadId,
}

impl Worker {
    fn spawn(name: &str) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Task>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for task in receiver {
                    run_guarded(task);
                }
            })?;
        debug!(name, "looper thread started");
        Ok(Self {
            sender,
            thread: handle.thread().id(),
        })
    }
}

impl Looper {
    /// A looper whose thread will carry `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            worker: OnceLock::new(),
        }
    }

    /// Spawn the thread now. Returns `false` if it could not be spawned.
    pub fn start(&self) -> bool {
        self.worker().is_some()
    }

    fn worker(&self) -> Option<&Worker> {
        self.worker
            .get_or_init(|| match Worker::spawn(&self.name) {
                Ok(worker) => Some(worker),
                Err(err) => {
                    error!(name = %self.name, %err, "failed to spawn looper thread");
                    None
                }
            })
            .as_ref()
    }
}

impl UiThread for Looper {
    fn is_current(&self) -> bool {
        self.worker
            .get()
            .and_then(Option::as_ref)
            .is_some_and(|worker| worker.thread == thread::current().id())
    }

    fn submit(&self, task: Task) {
        match self.worker() {
            Some(worker) => {
                if worker.sender.send(task).is_err() {
                    warn!(name = %self.name, "looper thread has exited; task dropped");
                }
            }
            None => warn!(name = %self.name, "looper unavailable; task dropped"),
        }
    }
}

impl fmt::Debug for Looper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Looper")
            .field("name", &self.name)
            .field("started", &self.worker.get().is_some_and(Option::is_some))
            .finish()
    }
}

// ============================================================================
// UiQueue
// ============================================================================

/// A UI thread driven by the host's own loop.
///
/// The thread that calls [`UiQueue::bind_current`] becomes the UI thread.
/// Submitted tasks wait until that thread pumps the queue.
#[derive(Clone)]
pub struct UiQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    thread: ThreadId,
    tasks: Mutex<VecDeque<Task>>,
    ready: Condvar,
}

impl UiQueue {
    /// Bind the calling thread as the UI thread.
    pub fn bind_current() -> Self {
        Self {
            inner: Arc::new(QueueInner {
                thread: thread::current().id(),
                tasks: Mutex::new(VecDeque::new()),
                ready: Condvar::new(),
            }),
        }
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.inner.tasks.lock().len()
    }

    /// Run queued tasks until the queue is empty, including tasks submitted by
    /// the tasks being run. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        debug_assert!(self.is_current(), "UiQueue pumped off its bound thread");
        let mut ran = 0;
        loop {
            let Some(task) = self.inner.tasks.lock().pop_front() else {
                return ran;
            };
            run_guarded(task);
            ran += 1;
        }
    }

    /// Pump the queue until `done` returns `true` or `timeout` elapses.
    /// Returns the final value of `done`.
    pub fn run_until(&self, mut done: impl FnMut() -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_pending();
            if done() {
                return true;
            }
            if !self.wait_for_task(deadline) {
                return done();
            }
        }
    }

    /// Pump the queue for `timeout`. Returns how many tasks ran.
    pub fn run_for(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut ran = 0;
        loop {
            ran += self.run_pending();
            if !self.wait_for_task(deadline) {
                return ran;
            }
        }
    }

    fn wait_for_task(&self, deadline: Instant) -> bool {
        let mut tasks = self.inner.tasks.lock();
        while tasks.is_empty() {
            if self.inner.ready.wait_until(&mut tasks, deadline).timed_out() {
                return !tasks.is_empty();
            }
        }
        true
    }
}

impl UiThread for UiQueue {
    fn is_current(&self) -> bool {
        self.inner.thread == thread::current().id()
    }

    fn submit(&self, task: Task) {
        self.inner.tasks.lock().push_back(task);
        self.inner.ready.notify_one();
    }
}

impl fmt::Debug for UiQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiQueue")
            .field("thread", &self.inner.thread)
            .field("pending", &self.pending())
            .finish()
    }
}

// ============================================================================
// Process default
// ============================================================================

static UI_THREAD: OnceLock<Arc<dyn UiThread>> = OnceLock::new();

/// Install the process-wide UI thread. Fails, returning `ui`, if a UI thread
/// was already installed or the default was already created.
pub fn install_ui_thread(ui: Arc<dyn UiThread>) -> Result<(), Arc<dyn UiThread>> {
    UI_THREAD.set(ui)?;
    debug!("installed process ui thread");
    Ok(())
}

/// The process-wide UI thread, creating the default [`Looper`] on first use.
pub fn ui_thread() -> Arc<dyn UiThread> {
    Arc::clone(UI_THREAD.get_or_init(|| Arc::new(Looper::new("lightbus-ui"))))
}
