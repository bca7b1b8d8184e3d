//! Event publishing with per-message delivery confirmation.
//!
//! A batch is handed to the [`Broker`] one message at a time; every accepted
//! message later produces exactly one [`DeliveryReport`]. [`Publisher`] waits
//! for the reports of everything it enqueued and folds the failures into a
//! single [`PublishError`].

mod error;
mod jetstream;
mod retry;
mod test_broker;

pub use error::{BrokerError, PublishError};
pub use jetstream::{JetStreamBroker, KEY_HEADER};
pub use retry::RetryPolicy;
pub use test_broker::TestBroker;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;

/// How long disconnect waits for outstanding deliveries.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything that can be published as a single broker message.
pub trait OutboundEvent {
    fn subject(&self) -> &str;

    /// Partition key. Events with the same key stay in order.
    fn key(&self) -> &str;

    /// Broker-side deduplication id, stable across retries.
    fn message_id(&self) -> &str;

    fn payload(&self) -> Result<Bytes, serde_json::Error>;
}

/// An encoded event ready for the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub subject: String,
    pub key: String,
    pub message_id: String,
    pub payload: Bytes,
}

impl OutboundMessage {
    pub fn encode<E: OutboundEvent>(event: &E) -> Result<Self, PublishError> {
        let key = event.key().to_string();
        let payload = event
            .payload()
            .map_err(|source| PublishError::Encode { key: key.clone(), source })?;
        Ok(Self {
            subject: event.subject().to_string(),
            key,
            message_id: event.message_id().to_string(),
            payload,
        })
    }
}

/// Delivery outcome for one enqueued message.
#[derive(Debug)]
pub struct DeliveryReport {
    pub key: String,
    pub result: Result<(), BrokerError>,
}

/// Broker session.
///
/// `produce` returning `Ok` means the message was queued; its outcome is sent
/// to `reports` later, exactly once.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn produce(
        &self,
        message: OutboundMessage,
        reports: mpsc::Sender<DeliveryReport>,
    ) -> Result<(), BrokerError>;

    /// Wait up to `timeout` for outstanding deliveries. Returns how many were
    /// abandoned.
    async fn flush(&self, timeout: Duration) -> usize;

    async fn close(&self);
}

/// Publishes event batches and waits for their delivery reports.
///
/// Shared across request tasks. Cancelling the parent token (or calling
/// [`Publisher::disconnect`]) makes every in-progress wait return
/// [`PublishError::Cancelled`].
pub struct Publisher {
    broker: Arc<dyn Broker>,
    shutdown: CancellationToken,
    retry: RetryPolicy,
}

impl Publisher {
    pub fn new(broker: Arc<dyn Broker>, shutdown: &CancellationToken) -> Self {
        Self {
            broker,
            shutdown: shutdown.child_token(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Connect to JetStream with the given settings.
    pub async fn connect(
        config: &BrokerConfig,
        shutdown: &CancellationToken,
    ) -> Result<Self, PublishError> {
        let broker = JetStreamBroker::connect(config)
            .await
            .map_err(PublishError::Connect)?;
        Ok(Self::new(Arc::new(broker), shutdown))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Publish every event and wait for each delivery report.
    ///
    /// An enqueue failure stops the batch; events already enqueued are still
    /// waited on. All failures are returned together.
    pub async fn publish_batch<E: OutboundEvent>(&self, events: &[E]) -> Result<(), PublishError> {
        if events.is_empty() {
            return Ok(());
        }

        let (reports_tx, mut reports) = mpsc::channel(events.len());
        let mut failures = Vec::new();
        let mut enqueued = 0usize;

        for event in events {
            if self.shutdown.is_cancelled() {
                failures.push(PublishError::Cancelled);
                break;
            }

            let message = match OutboundMessage::encode(event) {
                Ok(message) => message,
                Err(e) => {
                    failures.push(e);
                    break;
                }
            };

            let key = message.key.clone();
            match self.broker.produce(message, reports_tx.clone()).await {
                Ok(()) => enqueued += 1,
                Err(source) => {
                    failures.push(PublishError::Enqueue { key, source });
                    break;
                }
            }
        }
        drop(reports_tx);

        debug!(batch = events.len(), enqueued, "Waiting for delivery reports");

        let mut received = 0usize;
        while received < enqueued {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    if !failures.iter().any(|e| matches!(e, PublishError::Cancelled)) {
                        failures.push(PublishError::Cancelled);
                    }
                    break;
                }
                report = reports.recv() => match report {
                    Some(report) => {
                        received += 1;
                        if let Err(source) = report.result {
                            failures.push(PublishError::Delivery { key: report.key, source });
                        }
                    }
                    None => {
                        failures.push(PublishError::ReportsLost {
                            missing: enqueued - received,
                        });
                        break;
                    }
                },
            }
        }

        match PublishError::join(failures) {
            None => Ok(()),
            Some(err) => {
                warn!(batch = events.len(), enqueued, error = %err, "Batch publish failed");
                Err(err)
            }
        }
    }

    /// Publish the whole batch, retrying it with backoff until it succeeds or
    /// the attempts run out.
    pub async fn publish_batch_with_retry<E: OutboundEvent>(
        &self,
        events: &[E],
    ) -> Result<(), PublishError> {
        let mut attempts = 0u32;
        let mut last_error = None;

        for attempt in 1..=self.retry.max_attempts {
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                tokio::select! {
                    _ = self.shutdown.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            attempts = attempt;
            match self.publish_batch(events).await {
                Ok(()) => {
                    if attempt > 1 {
                        info!(attempt, "Batch published after retry");
                    }
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "Publish attempt failed"
                    );
                    last_error = Some(e);
                    if self.shutdown.is_cancelled() {
                        break;
                    }
                }
            }
        }

        Err(PublishError::Exhausted {
            attempts,
            source: Box::new(last_error.unwrap_or(PublishError::Cancelled)),
        })
    }

    /// Stop accepting work, drain what the broker still holds, and close it.
    pub async fn disconnect(&self) {
        self.shutdown.cancel();

        let abandoned = self.broker.flush(DRAIN_TIMEOUT).await;
        if abandoned > 0 {
            warn!(abandoned, "Abandoned undelivered events on disconnect");
        }

        self.broker.close().await;
        info!("Publisher disconnected");
    }
}
