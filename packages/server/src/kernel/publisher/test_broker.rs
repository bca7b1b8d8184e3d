//! In-memory broker for tests.
//!
//! Records every delivered message and can be scripted to fail deliveries,
//! reject enqueues, hold reports back, or lose them.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Broker, BrokerError, DeliveryReport, OutboundMessage};

type HeldReport = (DeliveryReport, mpsc::Sender<DeliveryReport>);

#[derive(Default)]
pub struct TestBroker {
    /// Messages whose delivery succeeded.
    delivered: RwLock<Vec<OutboundMessage>>,
    produce_calls: AtomicUsize,
    failing_deliveries: AtomicUsize,
    outage: AtomicBool,
    accept_limit: Mutex<Option<usize>>,
    stalled: AtomicBool,
    held: Mutex<Vec<HeldReport>>,
    lose_reports: AtomicBool,
    abandoned: AtomicUsize,
    closed: AtomicBool,
}

impl TestBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the delivery of the next `count` produced messages.
    pub fn fail_next_deliveries(&self, count: usize) {
        self.failing_deliveries.store(count, Ordering::SeqCst);
    }

    /// Fail every delivery until switched off.
    pub fn set_outage(&self, on: bool) {
        self.outage.store(on, Ordering::SeqCst);
    }

    /// Accept `count` more messages, then reject enqueues with `QueueFull`.
    pub fn reject_enqueue_after(&self, count: usize) {
        let limit = self.produce_calls.load(Ordering::SeqCst) + count;
        *self.accept_limit.lock().unwrap_or_else(|e| e.into_inner()) = Some(limit);
    }

    /// Hold delivery reports back until flush abandons them.
    pub fn stall_deliveries(&self, on: bool) {
        self.stalled.store(on, Ordering::SeqCst);
    }

    /// Accept messages but never report on them.
    pub fn drop_reports(&self, on: bool) {
        self.lose_reports.store(on, Ordering::SeqCst);
    }

    pub fn produce_calls(&self) -> usize {
        self.produce_calls.load(Ordering::SeqCst)
    }

    /// Messages abandoned by flush.
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// All successfully delivered messages, in delivery order.
    pub fn published_messages(&self) -> Vec<OutboundMessage> {
        self.delivered
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn messages_for_key(&self, key: &str) -> Vec<OutboundMessage> {
        self.delivered
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|m| m.key == key)
            .cloned()
            .collect()
    }

    fn next_delivery_fails(&self) -> bool {
        self.outage.load(Ordering::SeqCst)
            || self
                .failing_deliveries
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
    }
}

#[async_trait]
impl Broker for TestBroker {
    async fn produce(
        &self,
        message: OutboundMessage,
        reports: mpsc::Sender<DeliveryReport>,
    ) -> Result<(), BrokerError> {
        if self.is_closed() {
            return Err(BrokerError::Closed);
        }

        let call = self.produce_calls.fetch_add(1, Ordering::SeqCst);
        let limit = *self.accept_limit.lock().unwrap_or_else(|e| e.into_inner());
        if limit.is_some_and(|limit| call >= limit) {
            return Err(BrokerError::QueueFull);
        }

        if self.lose_reports.load(Ordering::SeqCst) {
            return Ok(());
        }

        let result = if self.next_delivery_fails() {
            Err(BrokerError::Rejected("simulated broker outage".to_string()))
        } else {
            Ok(())
        };
        let report = DeliveryReport {
            key: message.key.clone(),
            result,
        };

        if self.stalled.load(Ordering::SeqCst) {
            self.held
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((report, reports));
            return Ok(());
        }

        if report.result.is_ok() {
            self.delivered
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .push(message);
        }
        tokio::spawn(async move {
            let _ = reports.send(report).await;
        });
        Ok(())
    }

    async fn flush(&self, _timeout: Duration) -> usize {
        let held = std::mem::take(&mut *self.held.lock().unwrap_or_else(|e| e.into_inner()));
        self.abandoned.fetch_add(held.len(), Ordering::SeqCst);
        held.len()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
