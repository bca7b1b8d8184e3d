//! NATS JetStream broker.
//!
//! A JetStream publish returns as soon as the message is handed to the client;
//! the server acknowledgement arrives later through a `PublishAckFuture`. Each
//! of those futures is awaited on its own task, which reports the outcome to
//! the batch that sent the message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_nats::jetstream;
use async_nats::HeaderMap;
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info};

use super::{Broker, BrokerError, DeliveryReport, OutboundMessage};
use crate::config::BrokerConfig;

/// Header carrying the partition key (the company id).
pub const KEY_HEADER: &str = "Company-Key";

pub struct JetStreamBroker {
    client: async_nats::Client,
    context: jetstream::Context,
    in_flight: Mutex<JoinSet<()>>,
    closed: AtomicBool,
}

impl JetStreamBroker {
    /// Connect to NATS and make sure the configured stream exists.
    pub async fn connect(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let client = async_nats::connect(&config.url)
            .await
            .map_err(|e| BrokerError::Client(e.into()))?;

        let mut context = jetstream::new(client.clone());
        context.set_timeout(config.ack_timeout);

        context
            .get_or_create_stream(jetstream::stream::Config {
                name: config.stream.clone(),
                subjects: config.subjects.clone(),
                ..Default::default()
            })
            .await
            .map_err(|e| BrokerError::Client(e.into()))?;

        info!(url = %config.url, stream = %config.stream, "Connected to NATS JetStream");

        Ok(Self {
            client,
            context,
            in_flight: Mutex::new(JoinSet::new()),
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Broker for JetStreamBroker {
    async fn produce(
        &self,
        message: OutboundMessage,
        reports: mpsc::Sender<DeliveryReport>,
    ) -> Result<(), BrokerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BrokerError::Closed);
        }

        let mut headers = HeaderMap::new();
        headers.insert(async_nats::header::NATS_MESSAGE_ID, message.message_id.as_str());
        headers.insert(KEY_HEADER, message.key.as_str());

        let ack = self
            .context
            .publish_with_headers(message.subject, headers, message.payload)
            .await
            .map_err(|e| BrokerError::Client(e.into()))?;

        let key = message.key;
        let mut in_flight = self.in_flight.lock().await;
        // Reap finished ack tasks so the set only holds outstanding ones
        while in_flight.try_join_next().is_some() {}
        in_flight.spawn(async move {
            let result = match ack.await {
                Ok(ack) if ack.duplicate => {
                    debug!(key = %key, stream = %ack.stream, "Duplicate publish acknowledged");
                    Ok(())
                }
                Ok(_) => Ok(()),
                Err(e) => Err(BrokerError::Client(e.into())),
            };
            let _ = reports.send(DeliveryReport { key, result }).await;
        });

        Ok(())
    }

    async fn flush(&self, timeout: Duration) -> usize {
        let _ = self.client.flush().await;

        let mut in_flight = self.in_flight.lock().await;
        let drained = tokio::time::timeout(timeout, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await;

        match drained {
            Ok(()) => 0,
            Err(_) => {
                let remaining = in_flight.len();
                in_flight.abort_all();
                remaining
            }
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let _ = self.client.flush().await;
        info!("NATS session closed");
    }
}
