pub mod async_dispatcher;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod registry;
pub mod types;

use std::any::Any;
use std::fmt;

/// Listener priority. Lower values run earlier.
pub type Priority = i32;

/// Priority used when none is given
pub const DEFAULT_PRIORITY: Priority = 0;
/// Conventional highest priority (runs first)
pub const MIN_PRIORITY: Priority = -20;
/// Conventional lowest priority (runs last)
pub const MAX_PRIORITY: Priority = 20;

/// Dispatch bookkeeping shared by every event.
///
/// The dispatcher stamps `name` and `dispatcher` right before the first
/// listener runs; listeners flip `propagation_stopped` to skip the rest.
#[derive(Debug, Clone, Default)]
pub struct EventState {
    name: Option<String>,
    dispatcher: Option<WeakDispatcher>,
    propagation_stopped: bool,
}

impl EventState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dispatcher(&self) -> Option<&WeakDispatcher> {
        self.dispatcher.as_ref()
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub(crate) fn stamp(&mut self, name: &str, dispatcher: WeakDispatcher) {
        self.name = Some(name.to_owned());
        self.dispatcher = Some(dispatcher);
    }
}

/// Core event trait
///
/// Implementors embed an [`EventState`] and expose it; everything else on the
/// type is payload the dispatcher never looks at.
pub trait Event: Any + fmt::Debug + Send + Sync + 'static {
    /// Dispatch bookkeeping of this event
    fn state(&self) -> &EventState;

    /// Mutable dispatch bookkeeping of this event
    fn state_mut(&mut self) -> &mut EventState;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Cast to mutable Any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Identifier this event was last dispatched under
    fn name(&self) -> Option<&str> {
        self.state().name()
    }

    /// Dispatcher that last dispatched this event
    fn dispatcher(&self) -> Option<&WeakDispatcher> {
        self.state().dispatcher()
    }

    /// Has the event propagation ended?
    fn is_propagation_stopped(&self) -> bool {
        self.state().is_propagation_stopped()
    }

    /// Stop event propagation, meaning that the remaining listeners won't be
    /// called after this one.
    fn stop_propagation(&mut self) {
        self.state_mut().stop_propagation();
    }
}

impl dyn Event {
    pub fn is<T: Event>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Event>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Re-export important types
pub use async_dispatcher::AsyncEventDispatcher;
pub use dispatcher::{
    AnyDispatcher, AsyncMode, DispatchMode, DispatchOutcome, Dispatcher, EventDispatcher, SyncMode,
    WeakDispatcher,
};
pub use error::{EventError, Result};
pub use listener::{
    AsyncHandler, AsyncListener, BoxFuture, Listener, ListenerError, ListenerKind, ListenerResult,
    SyncHandler, SyncListener,
};
pub use registry::{Items, ListenerRegistry, Listeners};
pub use types::{BasicEvent, PayloadEvent};
