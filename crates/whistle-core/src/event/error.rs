//! # Whistle Event System Errors
//!
//! Defines [`EventError`], the error type returned by listener registration,
//! removal and dispatch.
//!
//! Errors raised by listeners themselves are carried through untouched in
//! [`EventError::Listener`]; the dispatcher never translates or swallows them.
use std::result::Result as StdResult;

use thiserror::Error;

use crate::event::Priority;
use crate::event::listener::{ListenerError, ListenerKind};

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Invalid listener for event '{event_id}': expected {expected}, got {actual}")]
    InvalidListener {
        event_id: String,
        expected: ListenerKind,
        actual: ListenerKind,
    },

    #[error("Priority {priority} for event '{event_id}' is outside the allowed range {min}..={max}")]
    InvalidPriority {
        event_id: String,
        priority: Priority,
        min: Priority,
        max: Priority,
    },

    #[error("Unknown event '{event_id}': no listener was ever registered for it")]
    UnknownEvent { event_id: String },

    #[error("{operation} is not supported by this dispatcher: {hint}")]
    NotSupported {
        operation: &'static str,
        hint: &'static str,
    },

    /// A listener failed; the remaining listeners were not invoked.
    #[error(transparent)]
    Listener(ListenerError),
}

impl EventError {
    /// Unwrap the error a listener returned, if this is one.
    pub fn into_listener_error(self) -> Option<ListenerError> {
        match self {
            EventError::Listener(source) => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = StdResult<T, EventError>;
