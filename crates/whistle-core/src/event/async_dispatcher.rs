use crate::event::dispatcher::{AsyncMode, DispatchOutcome, Dispatcher, log_outcome};
use crate::event::error::{EventError, Result};
use crate::event::listener::AsyncListener;
use crate::event::types::BasicEvent;
use crate::event::Event;

/// Dispatcher awaiting asynchronous listeners one after the other.
pub type AsyncEventDispatcher = Dispatcher<AsyncMode>;

const SYNC_DISPATCH_HINT: &str = "listeners are asynchronous, use adispatch instead";

impl Dispatcher<AsyncMode> {
    /// Always fails with [`EventError::NotSupported`].
    pub fn dispatch(&self, _event_id: &str) -> Result<BasicEvent> {
        Err(sync_dispatch_unsupported())
    }

    /// Always fails with [`EventError::NotSupported`].
    pub fn dispatch_with<E: Event>(&self, _event_id: &str, _event: E) -> Result<E> {
        Err(sync_dispatch_unsupported())
    }

    /// Always fails with [`EventError::NotSupported`].
    pub fn dispatch_mut(&self, _event_id: &str, _event: &mut dyn Event) -> Result<DispatchOutcome> {
        Err(sync_dispatch_unsupported())
    }

    /// Dispatch a fresh [`BasicEvent`] under `event_id` and return it.
    pub async fn adispatch(&self, event_id: &str) -> Result<BasicEvent> {
        self.adispatch_with(event_id, BasicEvent::new()).await
    }

    pub async fn adispatch_with<E: Event>(&self, event_id: &str, mut event: E) -> Result<E> {
        self.adispatch_mut(event_id, &mut event).await?;
        Ok(event)
    }

    /// Await every listener in priority order, one at a time.
    ///
    /// A listener only starts once the previous one completed, whatever
    /// either of them awaits internally. Dropping the returned future stops
    /// the walk; remaining listeners never run.
    pub async fn adispatch_mut(
        &self,
        event_id: &str,
        event: &mut dyn Event,
    ) -> Result<DispatchOutcome> {
        let listeners = self.prepare(event_id, event);
        let result = run_async(&listeners, event).await;
        log_outcome(event_id, &result);
        result
    }
}

fn sync_dispatch_unsupported() -> EventError {
    EventError::NotSupported {
        operation: "dispatch",
        hint: SYNC_DISPATCH_HINT,
    }
}

async fn run_async(listeners: &[AsyncListener], event: &mut dyn Event) -> Result<DispatchOutcome> {
    for listener in listeners {
        listener.call(event).await.map_err(EventError::Listener)?;
        if event.is_propagation_stopped() {
            return Ok(DispatchOutcome::Stopped);
        }
    }
    Ok(DispatchOutcome::Completed)
}
