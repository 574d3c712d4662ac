//! Error types for lightbus.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`BusError`] - Top-level error type returned by dispatcher operations
//! - [`HandlerError`] - The fault of a single handler invocation

use thiserror::Error;

/// A boxed error type for fallible handler actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for dispatcher operations.
#[derive(Error, Debug)]
pub enum BusError {
    /// A handler faulted and the dispatcher is configured to propagate faults.
    #[error("handler for `{event_type}` faulted: {source}")]
    Handler {
        /// Name of the event type the handler was registered for.
        event_type: &'static str,
        /// What went wrong.
        #[source]
        source: HandlerError,
    },

    /// The execution pool used by the background posters is unavailable.
    #[error("execution pool unavailable: {0}")]
    Executor(#[from] std::io::Error),
}

/// The fault of a single handler invocation.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The handler action returned an error.
    #[error("handler returned an error: {0}")]
    Failed(#[source] BoxError),

    /// The handler action panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// The event view handed to the handler does not hold its declared type.
    #[error("event view does not hold a `{expected}`")]
    TypeMismatch {
        /// Name of the type the handler expected.
        expected: &'static str,
    },
}

impl HandlerError {
    /// Build a [`HandlerError::Panicked`] from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        HandlerError::Panicked(message)
    }
}

impl From<BoxError> for HandlerError {
    fn from(err: BoxError) -> Self {
        HandlerError::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_become_messages() {
        let err = HandlerError::from_panic(Box::new("boom"));
        assert!(matches!(err, HandlerError::Panicked(ref m) if m == "boom"));

        let err = HandlerError::from_panic(Box::new(String::from("owned boom")));
        assert!(matches!(err, HandlerError::Panicked(ref m) if m == "owned boom"));

        let err = HandlerError::from_panic(Box::new(42_u8));
        assert!(matches!(err, HandlerError::Panicked(ref m) if m == "non-string panic payload"));
    }

    #[test]
    fn bus_error_names_the_event_type() {
        let err = BusError::Handler {
            event_type: "app::Saved",
            source: HandlerError::Panicked("boom".into()),
        };
        assert_eq!(
            err.to_string(),
            "handler for `app::Saved` faulted: handler panicked: boom"
        );
    }
}
