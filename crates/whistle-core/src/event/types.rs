use std::any::Any;
use std::fmt;

use crate::event::{Event, EventState};

/// Default event, created by the dispatcher when the caller passes none.
#[derive(Debug, Clone, Default)]
pub struct BasicEvent {
    state: EventState,
}

impl BasicEvent {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Event for BasicEvent {
    fn state(&self) -> &EventState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EventState {
        &mut self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Event carrying an arbitrary payload next to the dispatch state.
///
/// Listeners reach the payload by downcasting to `PayloadEvent<T>`, or
/// through [`SyncListener::typed`](crate::event::SyncListener::typed).
#[derive(Clone, Default)]
pub struct PayloadEvent<T> {
    state: EventState,
    pub payload: T,
}

impl<T> PayloadEvent<T> {
    pub fn new(payload: T) -> Self {
        Self {
            state: EventState::new(),
            payload,
        }
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T: fmt::Debug> fmt::Debug for PayloadEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadEvent")
            .field("name", &self.state.name())
            .field("propagation_stopped", &self.state.is_propagation_stopped())
            .field("payload", &self.payload)
            .finish()
    }
}

impl<T> Event for PayloadEvent<T>
where
    T: Any + fmt::Debug + Send + Sync,
{
    fn state(&self) -> &EventState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EventState {
        &mut self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
