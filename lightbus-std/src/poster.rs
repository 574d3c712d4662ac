//! Bounded asynchronous task runner.
//!
//! A [`Poster`] feeds tasks to an executor while keeping at most `window` of
//! them running at once. Tasks beyond the window wait in a FIFO queue and
//! start in submission order as running tasks finish.
//!
//! The dispatcher uses a window of 1 for serial background delivery and a
//! larger window for parallel background delivery.

use crate::executor::{Executor, Task, shared_executor};
use lightbus_core::HandlerError;
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    fmt, io,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
use tracing::{error, trace, warn};

/// FIFO task runner with a concurrency window.
pub struct Poster {
    shared: Arc<Shared>,
}

struct Shared {
    window: usize,
    executor: Option<Arc<dyn Executor>>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    running: usize,
    queue: VecDeque<Task>,
}

impl Poster {
    /// A poster running on the process-wide shared executor. A window of 0 is
    /// treated as 1.
    pub fn new(window: usize) -> Self {
        Self::build(window, None)
    }

    /// A poster running on a specific executor.
    pub fn with_executor(window: usize, executor: Arc<dyn Executor>) -> Self {
        Self::build(window, Some(executor))
    }

    fn build(window: usize, executor: Option<Arc<dyn Executor>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                window: window.max(1),
                executor,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Maximum number of concurrently running tasks.
    pub fn window(&self) -> usize {
        self.shared.window
    }

    /// Tasks currently running.
    pub fn running(&self) -> usize {
        self.shared.state.lock().running
    }

    /// Tasks waiting for a free slot.
    pub fn queued(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Start `task` now if the window has room, otherwise queue it.
    ///
    /// Fails only when the executor cannot be obtained; the task is dropped.
    pub fn enqueue(&self, task: Task) -> io::Result<()> {
        let mut state = self.shared.state.lock();
        if state.running < self.shared.window {
            state.running += 1;
            drop(state);
            if let Err(err) = self.shared.start(task) {
                self.shared.schedule_next();
                return Err(err);
            }
        } else {
            state.queue.push_back(task);
            trace!(queued = state.queue.len(), window = self.shared.window, "poster window full");
        }
        Ok(())
    }
}

impl fmt::Debug for Poster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Poster")
            .field("window", &self.shared.window)
            .field("running", &state.running)
            .field("queued", &state.queue.len())
            .finish()
    }
}

impl Shared {
    fn executor(&self) -> io::Result<Arc<dyn Executor>> {
        match &self.executor {
            Some(executor) => Ok(Arc::clone(executor)),
            None => shared_executor(),
        }
    }

    /// Hand `task` to the executor. The caller has already reserved a slot.
    fn start(self: &Arc<Self>, task: Task) -> io::Result<()> {
        let executor = self.executor()?;
        let shared = Arc::clone(self);
        executor.execute(Box::new(move || {
            let _done = Completion(shared);
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                let err = HandlerError::from_panic(payload);
                warn!(%err, "poster task panicked");
            }
        }));
        Ok(())
    }

    /// Pass the slot freed by a finished task to the next queued task, or
    /// release it.
    fn schedule_next(self: &Arc<Self>) {
        loop {
            let next = {
                let mut state = self.state.lock();
                match state.queue.pop_front() {
                    Some(task) => task,
                    None => {
                        state.running -= 1;
                        return;
                    }
                }
            };
            match self.start(next) {
                Ok(()) => return,
                Err(err) => error!(%err, "dropping queued task: executor unavailable"),
            }
        }
    }
}

/// Releases the task's slot when the task finishes, panicking or not.
struct Completion(Arc<Shared>);

impl Drop for Completion {
    fn drop(&mut self) {
        self.0.schedule_next();
    }
}
