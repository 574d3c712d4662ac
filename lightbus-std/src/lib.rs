//! # lightbus-std
//!
//! Standard runtime pieces for the lightbus event dispatcher.
//!
//! This crate provides:
//! - **Execution**: the [`Executor`] seam and the process-wide shared pool
//! - **Posters**: [`Poster`], a FIFO task runner with a concurrency window
//! - **UI thread**: the [`UiThread`] seam with [`Looper`] and [`UiQueue`]
//! - **Testing**: recorders and executors for deterministic tests

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use lightbus_core;

// Modules
pub mod executor;
pub mod poster;
pub mod testing;
pub mod ui;

pub use executor::{Executor, Task, set_executor, shared_executor};
pub use poster::Poster;
pub use ui::{Looper, UiQueue, UiThread, install_ui_thread, ui_thread};

#[cfg(feature = "tokio")]
pub use executor::TokioExecutor;
