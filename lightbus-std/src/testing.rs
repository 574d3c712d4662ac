//! Testing utilities for lightbus.
//!
//! This module provides utilities to make testing handlers and delivery order
//! easier.
//!
//! # Features
//!
//! - [`Recorder`]: A shared log handlers push into, with a blocking wait
//! - [`InlineExecutor`]: Runs background tasks on the submitting thread
//! - [`CountingExecutor`]: Wraps another executor and counts submissions

use crate::executor::{Executor, Task};
use parking_lot::{Condvar, Mutex};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

// ============================================================================
// Recorder
// ============================================================================

/// A cloneable, thread-safe log of values.
///
/// # Example
///
/// ```rust
/// use lightbus_std::testing::Recorder;
/// use std::time::Duration;
///
/// let recorder = Recorder::new();
/// let sink = recorder.clone();
/// std::thread::spawn(move || sink.push(1));
///
/// assert!(recorder.wait_for(1, Duration::from_secs(5)));
/// assert_eq!(recorder.snapshot(), vec![1]);
/// ```
pub struct Recorder<T> {
    inner: Arc<RecorderInner<T>>,
}

struct RecorderInner<T> {
    values: Mutex<Vec<T>>,
    changed: Condvar,
}

impl<T> Recorder<T> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RecorderInner {
                values: Mutex::new(Vec::new()),
                changed: Condvar::new(),
            }),
        }
    }

    /// Append a value and wake waiters.
    pub fn push(&self, value: T) {
        self.inner.values.lock().push(value);
        self.inner.changed.notify_all();
    }

    /// Number of recorded values.
    pub fn len(&self) -> usize {
        self.inner.values.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.values.lock().is_empty()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.inner.values.lock())
    }

    /// Block until at least `count` values are recorded or `timeout` elapses.
    /// Returns whether the count was reached.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut values = self.inner.values.lock();
        while values.len() < count {
            if self.inner.changed.wait_until(&mut values, deadline).timed_out() {
                return values.len() >= count;
            }
        }
        true
    }
}

impl<T: Clone> Recorder<T> {
    /// Get a clone of the recorded values.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.values.lock().clone()
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

// ============================================================================
// Executors
// ============================================================================

/// Runs every task immediately on the calling thread.
///
/// Makes background delivery synchronous, which keeps ordering assertions
/// deterministic.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, task: Task) {
        task();
    }
}

/// Counts submissions before forwarding them to another executor.
pub struct CountingExecutor {
    inner: Arc<dyn Executor>,
    count: AtomicUsize,
}

impl CountingExecutor {
    /// Wrap `inner`.
    pub fn new(inner: Arc<dyn Executor>) -> Self {
        Self {
            inner,
            count: AtomicUsize::new(0),
        }
    }

    /// Number of tasks submitted so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Executor for CountingExecutor {
    fn execute(&self, task: Task) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(task);
    }
}
