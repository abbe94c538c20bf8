use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::{debug, trace};

use crate::config::{ConfigError, DispatcherConfig};
use crate::event::error::{EventError, Result};
use crate::event::listener::{AsyncListener, Listener, ListenerKind, SyncListener};
use crate::event::registry::{ListenerRegistry, Listeners};
use crate::event::types::BasicEvent;
use crate::event::{DEFAULT_PRIORITY, Event, Priority};

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::SyncMode {}
    impl Sealed for super::AsyncMode {}
}

/// Selects which listener shape a [`Dispatcher`] accepts and which dispatch
/// entry points actually run listeners.
pub trait DispatchMode: sealed::Sealed + Send + Sync + 'static {
    /// Concrete listener type stored by the registry
    type Listener: Clone
        + PartialEq
        + fmt::Debug
        + Send
        + Sync
        + TryFrom<Listener, Error = Listener>
        + 'static;

    const KIND: ListenerKind;
}

/// Listeners are plain calls; `dispatch` runs them.
#[derive(Debug)]
pub enum SyncMode {}

/// Listeners are awaited; `adispatch` runs them.
#[derive(Debug)]
pub enum AsyncMode {}

impl DispatchMode for SyncMode {
    type Listener = SyncListener;
    const KIND: ListenerKind = ListenerKind::Sync;
}

impl DispatchMode for AsyncMode {
    type Listener = AsyncListener;
    const KIND: ListenerKind = ListenerKind::Async;
}

/// How a dispatch call that did not fail ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every listener ran
    Completed,
    /// A listener stopped propagation; the rest were skipped
    Stopped,
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Completed => f.write_str("completed"),
            DispatchOutcome::Stopped => f.write_str("stopped"),
        }
    }
}

/// State shared by every handle of one dispatcher (Internal)
pub(crate) struct DispatcherCore<L> {
    config: DispatcherConfig,
    listeners: Mutex<ListenerRegistry<L>>,
}

impl<L> DispatcherCore<L> {
    // No listener ever runs under this lock, so a poisoned registry is still consistent.
    fn registry(&self) -> MutexGuard<'_, ListenerRegistry<L>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//--------------------------------------------------
// Dispatcher (Public API)
//--------------------------------------------------

/// Keeps track of registered listeners and dispatches events to them.
///
/// All listeners are scoped to the dispatcher instance. Handles are cheap to
/// clone and share the same registry.
pub struct Dispatcher<M: DispatchMode> {
    core: Arc<DispatcherCore<M::Listener>>,
}

/// Dispatcher running synchronous listeners
pub type EventDispatcher = Dispatcher<SyncMode>;

impl<M: DispatchMode> Dispatcher<M> {
    pub fn new() -> Self {
        Self::from_config(DispatcherConfig::default())
    }

    /// Build a dispatcher with `config`, rejecting configurations that fail
    /// [`DispatcherConfig::validate`].
    pub fn with_config(config: DispatcherConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: DispatcherConfig) -> Self {
        Self {
            core: Arc::new(DispatcherCore {
                config,
                listeners: Mutex::new(ListenerRegistry::new()),
            }),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.core.config
    }

    /// Listener shape this dispatcher accepts
    pub fn kind(&self) -> ListenerKind {
        M::KIND
    }

    /// Non-owning handle, as stamped on dispatched events
    pub fn downgrade(&self) -> WeakDispatcher {
        let core: Weak<DispatcherCore<M::Listener>> = Arc::downgrade(&self.core);
        WeakDispatcher {
            core,
            kind: M::KIND,
        }
    }

    /// Register `listener` for `event_id` at [`DEFAULT_PRIORITY`].
    pub fn add_listener(&self, event_id: &str, listener: impl Into<Listener>) -> Result<()> {
        self.add_listener_at(event_id, listener, DEFAULT_PRIORITY)
    }

    /// Register `listener` for `event_id` at `priority`.
    ///
    /// Fails with [`EventError::InvalidListener`] when the listener shape does
    /// not match this dispatcher, and with [`EventError::InvalidPriority`] when
    /// the configuration enforces a range that `priority` falls outside of.
    /// A rejected listener is not registered.
    pub fn add_listener_at(
        &self,
        event_id: &str,
        listener: impl Into<Listener>,
        priority: Priority,
    ) -> Result<()> {
        let listener = listener.into();
        let actual = listener.kind();
        let listener =
            M::Listener::try_from(listener).map_err(|_| EventError::InvalidListener {
                event_id: event_id.to_owned(),
                expected: M::KIND,
                actual,
            })?;

        let config = &self.core.config;
        if config.enforce_priority_range && !config.priority_range.contains(priority) {
            return Err(EventError::InvalidPriority {
                event_id: event_id.to_owned(),
                priority,
                min: config.priority_range.min,
                max: config.priority_range.max,
            });
        }

        self.core.registry().add(event_id, listener, priority);
        debug!("Registered {} listener for event '{event_id}' at priority {priority}", M::KIND);
        Ok(())
    }

    /// Remove every registration of `listener` for `event_id`.
    ///
    /// Fails with [`EventError::UnknownEvent`] if nothing was ever registered
    /// for `event_id`.
    pub fn remove_listener(&self, event_id: &str, listener: impl Into<Listener>) -> Result<()> {
        let mut registry = self.core.registry();
        match M::Listener::try_from(listener.into()) {
            Ok(listener) => registry.remove(event_id, &listener).map(|_| ()),
            // The other shape can never be registered here
            Err(_) if registry.contains_key(event_id) => Ok(()),
            Err(_) => Err(EventError::UnknownEvent {
                event_id: event_id.to_owned(),
            }),
        }
    }

    /// Ordered listeners for `event_id`; empty if none are registered.
    pub fn get_listeners(&self, event_id: &str) -> Listeners<M::Listener> {
        self.core.registry().get(event_id)
    }

    /// Ordered listeners of every known event id.
    pub fn all_listeners(&self) -> BTreeMap<String, Listeners<M::Listener>> {
        self.core.registry().all()
    }

    pub fn has_listeners(&self, event_id: &str) -> bool {
        self.core.registry().has(event_id)
    }

    /// Whether any event id was ever registered. Ids whose listeners were all
    /// removed still count.
    pub fn has_any_listeners(&self) -> bool {
        !self.core.registry().is_empty()
    }

    /// Registration closure for `event_id`: registers the listener it is given
    /// and hands it back unchanged.
    ///
    /// ```ignore
    /// let on_order = dispatcher.listen("order.placed", -10);
    /// let validate = on_order(SyncListener::new(validate_order))?;
    /// ```
    pub fn listen<L>(&self, event_id: &str, priority: Priority) -> impl Fn(L) -> Result<L> + '_
    where
        L: Into<Listener> + Clone,
    {
        let event_id = event_id.to_owned();
        move |listener: L| {
            self.add_listener_at(&event_id, listener.clone(), priority)?;
            Ok(listener)
        }
    }

    /// Stamp identity on `event` and snapshot the listeners to run.
    pub(crate) fn prepare(&self, event_id: &str, event: &mut dyn Event) -> Listeners<M::Listener> {
        event.state_mut().stamp(event_id, self.downgrade());
        let listeners = self.core.registry().get(event_id);
        trace!(
            "Dispatching '{event_id}' to {} {} listener(s)",
            listeners.len(),
            M::KIND
        );
        listeners
    }
}

pub(crate) fn log_outcome(event_id: &str, result: &Result<DispatchOutcome>) {
    match result {
        Ok(DispatchOutcome::Stopped) => debug!("Propagation of '{event_id}' stopped early"),
        Ok(outcome) => trace!("Dispatch of '{event_id}' {outcome}"),
        Err(error) => trace!("Dispatch of '{event_id}' failed: {error}"),
    }
}

impl Dispatcher<SyncMode> {
    /// Dispatch a fresh [`BasicEvent`] under `event_id` and return it.
    pub fn dispatch(&self, event_id: &str) -> Result<BasicEvent> {
        self.dispatch_with(event_id, BasicEvent::new())
    }

    /// Dispatch the given event under `event_id` and return it once every
    /// listener ran or one of them stopped propagation.
    pub fn dispatch_with<E: Event>(&self, event_id: &str, mut event: E) -> Result<E> {
        self.dispatch_mut(event_id, &mut event)?;
        Ok(event)
    }

    /// Dispatch a borrowed event; the caller keeps it even if a listener fails.
    pub fn dispatch_mut(&self, event_id: &str, event: &mut dyn Event) -> Result<DispatchOutcome> {
        let listeners = self.prepare(event_id, event);
        let result = run_sync(&listeners, event);
        log_outcome(event_id, &result);
        result
    }

    /// Same as [`dispatch`](Self::dispatch), callable from async code.
    ///
    /// Fails with [`EventError::NotSupported`] when the configuration sets
    /// `strict_async_bridge`.
    pub async fn adispatch(&self, event_id: &str) -> Result<BasicEvent> {
        self.check_bridge()?;
        self.dispatch(event_id)
    }

    pub async fn adispatch_with<E: Event>(&self, event_id: &str, event: E) -> Result<E> {
        self.check_bridge()?;
        self.dispatch_with(event_id, event)
    }

    pub async fn adispatch_mut(
        &self,
        event_id: &str,
        event: &mut dyn Event,
    ) -> Result<DispatchOutcome> {
        self.check_bridge()?;
        self.dispatch_mut(event_id, event)
    }

    fn check_bridge(&self) -> Result<()> {
        if self.core.config.strict_async_bridge {
            return Err(EventError::NotSupported {
                operation: "adispatch",
                hint: "strict_async_bridge is set, call dispatch on a synchronous dispatcher",
            });
        }
        Ok(())
    }
}

fn run_sync(listeners: &[SyncListener], event: &mut dyn Event) -> Result<DispatchOutcome> {
    for listener in listeners {
        listener.call(event).map_err(EventError::Listener)?;
        if event.is_propagation_stopped() {
            return Ok(DispatchOutcome::Stopped);
        }
    }
    Ok(DispatchOutcome::Completed)
}

impl<M: DispatchMode> Clone for Dispatcher<M> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<M: DispatchMode> Default for Dispatcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

// Manual Debug impl, listeners themselves are opaque
impl<M: DispatchMode> fmt::Debug for Dispatcher<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("kind", &M::KIND)
            .field("config", &self.core.config)
            .field("listeners", &*self.core.registry())
            .finish()
    }
}

//--------------------------------------------------
// WeakDispatcher
//--------------------------------------------------

/// Non-owning back-reference from an event to the dispatcher that
/// dispatched it.
#[derive(Clone)]
pub struct WeakDispatcher {
    core: Weak<dyn Any + Send + Sync>,
    kind: ListenerKind,
}

impl WeakDispatcher {
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// False once every handle of the dispatcher has been dropped
    pub fn is_alive(&self) -> bool {
        self.core.strong_count() > 0
    }

    /// Recover the dispatcher if it is still alive and runs in mode `M`.
    pub fn upgrade<M: DispatchMode>(&self) -> Option<Dispatcher<M>> {
        let core = self
            .core
            .upgrade()?
            .downcast::<DispatcherCore<M::Listener>>()
            .ok()?;
        Some(Dispatcher { core })
    }

    /// Recover the dispatcher whatever its mode.
    pub fn upgrade_any(&self) -> Option<AnyDispatcher> {
        match self.kind {
            ListenerKind::Sync => self.upgrade::<SyncMode>().map(AnyDispatcher::Sync),
            ListenerKind::Async => self.upgrade::<AsyncMode>().map(AnyDispatcher::Async),
        }
    }
}

impl PartialEq for WeakDispatcher {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.core, &other.core)
    }
}

impl Eq for WeakDispatcher {}

impl fmt::Debug for WeakDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDispatcher")
            .field("kind", &self.kind)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// A dispatcher of either mode, as recovered from a [`WeakDispatcher`].
#[derive(Debug, Clone)]
pub enum AnyDispatcher {
    Sync(Dispatcher<SyncMode>),
    Async(Dispatcher<AsyncMode>),
}

impl AnyDispatcher {
    pub fn kind(&self) -> ListenerKind {
        match self {
            AnyDispatcher::Sync(_) => ListenerKind::Sync,
            AnyDispatcher::Async(_) => ListenerKind::Async,
        }
    }
}
