#![cfg(test)]

use std::sync::{Arc, Mutex};

use crate::{AsyncListener, Event, PayloadEvent, SyncListener};

// ===== ORDER DOMAIN =====

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: u32,
    pub total_cents: u64,
    pub status: OrderStatus,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Validated,
    Rejected,
    Shipped,
}

impl Order {
    pub fn new(id: u32, total_cents: u64) -> Self {
        Self {
            id,
            total_cents,
            status: OrderStatus::Pending,
            notes: Vec::new(),
        }
    }
}

pub type OrderEvent = PayloadEvent<Order>;

/// Shared trace of which listeners ran, in order
pub type Trace = Arc<Mutex<Vec<String>>>;

pub fn new_trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn snapshot(trace: &Trace) -> Vec<String> {
    trace.lock().unwrap().clone()
}

// ===== SYNC LISTENERS =====

/// Rejects empty orders and stops the workflow for them
pub fn validator(trace: &Trace) -> SyncListener {
    let trace = Arc::clone(trace);
    SyncListener::typed(move |event: &mut OrderEvent| {
        trace.lock().unwrap().push("validate".to_string());
        if event.payload.total_cents == 0 {
            event.payload.status = OrderStatus::Rejected;
            event.stop_propagation();
        } else {
            event.payload.status = OrderStatus::Validated;
        }
        Ok(())
    })
}

pub fn shipper(trace: &Trace) -> SyncListener {
    let trace = Arc::clone(trace);
    SyncListener::typed(move |event: &mut OrderEvent| {
        trace.lock().unwrap().push("ship".to_string());
        event.payload.status = OrderStatus::Shipped;
        Ok(())
    })
}

pub fn auditor(trace: &Trace) -> SyncListener {
    let trace = Arc::clone(trace);
    SyncListener::typed(move |event: &mut OrderEvent| {
        let line = format!("audit order {} ({:?})", event.payload.id, event.payload.status);
        trace.lock().unwrap().push("audit".to_string());
        event.payload.notes.push(line);
        Ok(())
    })
}

// ===== ASYNC LISTENERS =====

pub fn async_validator(trace: &Trace) -> AsyncListener {
    let trace = Arc::clone(trace);
    AsyncListener::typed::<OrderEvent, _>(move |event| {
        let trace = Arc::clone(&trace);
        Box::pin(async move {
            tokio::task::yield_now().await;
            trace.lock().unwrap().push("validate".to_string());
            if event.payload.total_cents == 0 {
                event.payload.status = OrderStatus::Rejected;
                event.stop_propagation();
            } else {
                event.payload.status = OrderStatus::Validated;
            }
            Ok(())
        })
    })
}

pub fn async_shipper(trace: &Trace) -> AsyncListener {
    let trace = Arc::clone(trace);
    AsyncListener::typed::<OrderEvent, _>(move |event| {
        let trace = Arc::clone(&trace);
        Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            trace.lock().unwrap().push("ship".to_string());
            event.payload.status = OrderStatus::Shipped;
            Ok(())
        })
    })
}

pub fn async_auditor(trace: &Trace) -> AsyncListener {
    let trace = Arc::clone(trace);
    AsyncListener::typed::<OrderEvent, _>(move |event| {
        let trace = Arc::clone(&trace);
        Box::pin(async move {
            let line = format!("audit order {} ({:?})", event.payload.id, event.payload.status);
            trace.lock().unwrap().push("audit".to_string());
            event.payload.notes.push(line);
            Ok(())
        })
    })
}
