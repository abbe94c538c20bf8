//! # Whistle Core
//!
//! In-process event dispatching. Listeners register against string event
//! identifiers with an integer priority; dispatching an identifier invokes
//! them in ascending priority order (registration order breaks ties) until
//! one of them stops propagation.
//!
//! Two dispatchers share the same registry and registration API:
//! [`EventDispatcher`] calls synchronous listeners, [`AsyncEventDispatcher`]
//! awaits asynchronous ones, strictly one after the other.
pub mod config;
pub mod event;

pub use config::{ConfigError, ConfigFormat, DispatcherConfig, PriorityRange};
pub use event::{
    AsyncEventDispatcher, AsyncHandler, AsyncListener, BasicEvent, BoxFuture, DispatchOutcome,
    Event, EventDispatcher, EventError, EventState, Listener, ListenerError, ListenerKind,
    ListenerRegistry, ListenerResult, PayloadEvent, Priority, SyncHandler, SyncListener,
    WeakDispatcher,
};
