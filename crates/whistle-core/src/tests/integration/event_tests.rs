#![cfg(test)]

use std::sync::Arc;

use crate::tests::integration::common::{
    async_auditor, async_shipper, async_validator, auditor, new_trace, shipper, snapshot,
    validator, Order, OrderEvent, OrderStatus,
};
use crate::{
    AsyncEventDispatcher, Event, EventDispatcher, EventError, ListenerError, PayloadEvent,
    SyncListener,
};

const ORDER_PLACED: &str = "order.placed";

fn sync_workflow(trace: &crate::tests::integration::common::Trace) -> EventDispatcher {
    let dispatcher = EventDispatcher::new();
    // Registered out of order on purpose, priorities decide
    dispatcher.add_listener_at(ORDER_PLACED, auditor(trace), 10).unwrap();
    dispatcher.add_listener_at(ORDER_PLACED, validator(trace), -10).unwrap();
    dispatcher.add_listener(ORDER_PLACED, shipper(trace)).unwrap();
    dispatcher
}

fn async_workflow(trace: &crate::tests::integration::common::Trace) -> AsyncEventDispatcher {
    let dispatcher = AsyncEventDispatcher::new();
    dispatcher.add_listener_at(ORDER_PLACED, async_auditor(trace), 10).unwrap();
    dispatcher.add_listener_at(ORDER_PLACED, async_validator(trace), -10).unwrap();
    dispatcher.add_listener(ORDER_PLACED, async_shipper(trace)).unwrap();
    dispatcher
}

#[test]
fn test_order_workflow_runs_by_priority() {
    let trace = new_trace();
    let dispatcher = sync_workflow(&trace);

    let event = dispatcher
        .dispatch_with(ORDER_PLACED, OrderEvent::new(Order::new(7, 2_500)))
        .expect("workflow should succeed");

    assert_eq!(snapshot(&trace), ["validate", "ship", "audit"]);
    assert_eq!(event.payload.status, OrderStatus::Shipped);
    assert_eq!(event.payload.notes, ["audit order 7 (Shipped)"]);
    assert_eq!(event.name(), Some(ORDER_PLACED));
}

#[test]
fn test_order_workflow_rejects_empty_order() {
    let trace = new_trace();
    let dispatcher = sync_workflow(&trace);

    let event = dispatcher
        .dispatch_with(ORDER_PLACED, OrderEvent::new(Order::new(8, 0)))
        .unwrap();

    assert_eq!(snapshot(&trace), ["validate"]);
    assert_eq!(event.payload.status, OrderStatus::Rejected);
    assert!(event.payload.notes.is_empty());
    assert!(event.is_propagation_stopped());
}

#[tokio::test]
async fn test_sync_and_async_workflows_agree() {
    let sync_trace = new_trace();
    let async_trace = new_trace();
    let sync_dispatcher = sync_workflow(&sync_trace);
    let async_dispatcher = async_workflow(&async_trace);

    for (id, total) in [(1, 100), (2, 0), (3, 42)] {
        let from_sync = sync_dispatcher
            .dispatch_with(ORDER_PLACED, OrderEvent::new(Order::new(id, total)))
            .unwrap();
        let from_async = async_dispatcher
            .adispatch_with(ORDER_PLACED, OrderEvent::new(Order::new(id, total)))
            .await
            .unwrap();

        assert_eq!(from_sync.payload, from_async.payload);
        assert_eq!(from_sync.is_propagation_stopped(), from_async.is_propagation_stopped());
    }

    assert_eq!(snapshot(&sync_trace), snapshot(&async_trace));
}

#[tokio::test]
async fn test_sync_workflow_through_async_bridge() {
    let trace = new_trace();
    let dispatcher = sync_workflow(&trace);

    let event = dispatcher
        .adispatch_with(ORDER_PLACED, OrderEvent::new(Order::new(9, 1)))
        .await
        .unwrap();

    assert_eq!(event.payload.status, OrderStatus::Shipped);
    assert_eq!(snapshot(&trace), ["validate", "ship", "audit"]);
}

#[test]
fn test_catch_all_identifier_is_not_special() {
    let trace = new_trace();
    let dispatcher = EventDispatcher::new();
    dispatcher.add_listener("*", auditor(&trace)).unwrap();
    dispatcher.add_listener(ORDER_PLACED, shipper(&trace)).unwrap();

    dispatcher
        .dispatch_with(ORDER_PLACED, OrderEvent::new(Order::new(1, 1)))
        .unwrap();
    assert_eq!(snapshot(&trace), ["ship"]);

    dispatcher.dispatch_with("*", OrderEvent::new(Order::new(1, 1))).unwrap();
    assert_eq!(snapshot(&trace), ["ship", "audit"]);
}

#[test]
fn test_plugin_style_registration() {
    // Each plugin owns its listeners and detaches them on unload
    struct MailerPlugin {
        on_registered: SyncListener,
    }

    impl MailerPlugin {
        fn new(outbox: Arc<std::sync::Mutex<Vec<String>>>) -> Self {
            Self {
                on_registered: SyncListener::typed(move |event: &mut PayloadEvent<String>| {
                    outbox.lock().unwrap().push(format!("welcome {}", event.payload));
                    Ok(())
                }),
            }
        }

        fn load(&self, dispatcher: &EventDispatcher) -> Result<(), EventError> {
            dispatcher.add_listener("user.registered", self.on_registered.clone())
        }

        fn unload(&self, dispatcher: &EventDispatcher) -> Result<(), EventError> {
            dispatcher.remove_listener("user.registered", self.on_registered.clone())
        }
    }

    let outbox = Arc::new(std::sync::Mutex::new(Vec::new()));
    let dispatcher = EventDispatcher::new();
    let plugin = MailerPlugin::new(Arc::clone(&outbox));

    plugin.load(&dispatcher).unwrap();
    dispatcher
        .dispatch_with("user.registered", PayloadEvent::new("ada".to_string()))
        .unwrap();

    plugin.unload(&dispatcher).unwrap();
    dispatcher
        .dispatch_with("user.registered", PayloadEvent::new("grace".to_string()))
        .unwrap();

    assert_eq!(*outbox.lock().unwrap(), ["welcome ada"]);
    assert!(!dispatcher.has_listeners("user.registered"));
    // Unloading twice is harmless once the event is known
    assert!(plugin.unload(&dispatcher).is_ok());
}

#[test]
fn test_listener_failure_surfaces_to_caller() {
    let trace = new_trace();
    let dispatcher = sync_workflow(&trace);
    dispatcher
        .add_listener_at(
            ORDER_PLACED,
            SyncListener::new(|_event| Err(ListenerError::from("inventory service unavailable"))),
            -5,
        )
        .unwrap();

    let err = dispatcher
        .dispatch_with(ORDER_PLACED, OrderEvent::new(Order::new(3, 300)))
        .expect_err("listener failure should abort the workflow");

    assert_eq!(err.to_string(), "inventory service unavailable");
    assert_eq!(snapshot(&trace), ["validate"]);
}

#[test]
fn test_dispatchers_are_shared_across_threads() {
    let trace = new_trace();
    let dispatcher = sync_workflow(&trace);

    let handles: Vec<_> = (0..4)
        .map(|id| {
            let dispatcher = dispatcher.clone();
            std::thread::spawn(move || {
                dispatcher
                    .dispatch_with(ORDER_PLACED, OrderEvent::new(Order::new(id, 10)))
                    .map(|event| event.payload.status)
            })
        })
        .collect();

    for handle in handles {
        let status = handle.join().expect("thread should not panic").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
    }
    assert_eq!(snapshot(&trace).len(), 12);
}
