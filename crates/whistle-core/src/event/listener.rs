use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::event::Event;

/// Error a listener may fail with. It reaches the dispatch caller unmodified.
pub type ListenerError = Box<dyn StdError + Send + Sync>;

/// What every listener returns
pub type ListenerResult = Result<(), ListenerError>;

// This type represents an owned future borrowing from its inputs for 'a
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Shape of a listener, checked against the dispatcher at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Plain function call, returns when done
    Sync,
    /// Returns a future the dispatcher awaits
    Async,
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerKind::Sync => f.write_str("synchronous"),
            ListenerKind::Async => f.write_str("asynchronous"),
        }
    }
}

/// Synchronous listener body
pub trait SyncHandler: Send + Sync {
    fn handle(&self, event: &mut dyn Event) -> ListenerResult;
}

impl<F> SyncHandler for F
where
    F: Fn(&mut dyn Event) -> ListenerResult + Send + Sync,
{
    fn handle(&self, event: &mut dyn Event) -> ListenerResult {
        self(event)
    }
}

/// Asynchronous listener body
#[async_trait]
pub trait AsyncHandler: Send + Sync {
    async fn handle(&self, event: &mut dyn Event) -> ListenerResult;
}

/// Adapter for closures returning a boxed future (Internal Helper)
struct AsyncFn<F>(F);

#[async_trait]
impl<F> AsyncHandler for AsyncFn<F>
where
    F: for<'a> Fn(&'a mut dyn Event) -> BoxFuture<'a, ListenerResult> + Send + Sync,
{
    async fn handle(&self, event: &mut dyn Event) -> ListenerResult {
        (self.0)(event).await
    }
}

/// Adapter for closures over one concrete event type (Internal Helper)
struct TypedAsyncFn<E, F> {
    f: F,
    _event: PhantomData<fn(&mut E)>,
}

#[async_trait]
impl<E, F> AsyncHandler for TypedAsyncFn<E, F>
where
    E: Event,
    F: for<'a> Fn(&'a mut E) -> BoxFuture<'a, ListenerResult> + Send + Sync,
{
    async fn handle(&self, event: &mut dyn Event) -> ListenerResult {
        match event.downcast_mut::<E>() {
            Some(event) => (self.f)(event).await,
            None => Ok(()),
        }
    }
}

/// A registered synchronous listener.
///
/// Identity is the shared handler allocation: clones compare equal, two
/// listeners built from the same closure source do not.
#[derive(Clone)]
pub struct SyncListener {
    handler: Arc<dyn SyncHandler>,
}

impl SyncListener {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Event) -> ListenerResult + Send + Sync + 'static,
    {
        Self::from_handler(f)
    }

    pub fn from_handler<H: SyncHandler + 'static>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Listener that only runs for events of type `E`; other event types
    /// pass through untouched.
    pub fn typed<E, F>(f: F) -> Self
    where
        E: Event,
        F: Fn(&mut E) -> ListenerResult + Send + Sync + 'static,
    {
        Self::new(move |event: &mut dyn Event| match event.downcast_mut::<E>() {
            Some(event) => f(event),
            None => Ok(()),
        })
    }

    pub fn call(&self, event: &mut dyn Event) -> ListenerResult {
        self.handler.handle(event)
    }
}

impl PartialEq for SyncListener {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.handler), Arc::as_ptr(&other.handler))
    }
}

impl Eq for SyncListener {}

impl fmt::Debug for SyncListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SyncListener")
            .field(&Arc::as_ptr(&self.handler).cast::<()>())
            .finish()
    }
}

/// A registered asynchronous listener. Identity works as for [`SyncListener`].
#[derive(Clone)]
pub struct AsyncListener {
    handler: Arc<dyn AsyncHandler>,
}

impl AsyncListener {
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut dyn Event) -> BoxFuture<'a, ListenerResult> + Send + Sync + 'static,
    {
        Self::from_handler(AsyncFn(f))
    }

    pub fn from_handler<H: AsyncHandler + 'static>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Async counterpart of [`SyncListener::typed`].
    pub fn typed<E, F>(f: F) -> Self
    where
        E: Event,
        F: for<'a> Fn(&'a mut E) -> BoxFuture<'a, ListenerResult> + Send + Sync + 'static,
    {
        Self::from_handler(TypedAsyncFn {
            f,
            _event: PhantomData,
        })
    }

    pub fn call<'a>(&'a self, event: &'a mut dyn Event) -> BoxFuture<'a, ListenerResult> {
        self.handler.handle(event)
    }
}

impl PartialEq for AsyncListener {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.handler), Arc::as_ptr(&other.handler))
    }
}

impl Eq for AsyncListener {}

impl fmt::Debug for AsyncListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AsyncListener")
            .field(&Arc::as_ptr(&self.handler).cast::<()>())
            .finish()
    }
}

/// Either listener shape, as accepted by `add_listener`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listener {
    Sync(SyncListener),
    Async(AsyncListener),
}

impl Listener {
    pub fn kind(&self) -> ListenerKind {
        match self {
            Listener::Sync(_) => ListenerKind::Sync,
            Listener::Async(_) => ListenerKind::Async,
        }
    }
}

impl From<SyncListener> for Listener {
    fn from(listener: SyncListener) -> Self {
        Listener::Sync(listener)
    }
}

impl From<AsyncListener> for Listener {
    fn from(listener: AsyncListener) -> Self {
        Listener::Async(listener)
    }
}

impl TryFrom<Listener> for SyncListener {
    type Error = Listener;

    fn try_from(listener: Listener) -> Result<Self, Self::Error> {
        match listener {
            Listener::Sync(listener) => Ok(listener),
            other => Err(other),
        }
    }
}

impl TryFrom<Listener> for AsyncListener {
    type Error = Listener;

    fn try_from(listener: Listener) -> Result<Self, Self::Error> {
        match listener {
            Listener::Async(listener) => Ok(listener),
            other => Err(other),
        }
    }
}
