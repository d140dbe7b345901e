//! In-memory message queue feeding a failover.
//!
//! [`channel`] returns a producer and a consumer joined by a bounded tokio
//! channel. Producers publish [`MessageDto`]s as JSON. The consumer takes one
//! message at a time, runs the blocking failover on tokio's blocking pool
//! and decides per message whether to acknowledge it:
//!
//! | Outcome | Acknowledged |
//! |---|---|
//! | failover returned `Ok(true)` or `Ok(false)` | yes |
//! | body is not a valid message | no |
//! | failover returned an error | no |
//! | the delivery task panicked | no |
//!
//! An unacknowledged message is reported in [`ConsumerReport::unacked`];
//! there is no redelivery.

use crate::error::QueueError;
use crate::failover::Failover;
use crate::message::{Message, MessageDto};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Name of the queue messages are published to.
pub const QUEUE_NAME: &str = "emails";

/// One message as it sits on the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Position in publish order, starting at 1.
    pub tag: u64,
    pub body: String,
}

/// Creates a queue holding at most `capacity` undelivered messages.
///
/// A capacity of zero is raised to one.
pub fn channel(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let producer = QueueProducer {
        tx,
        next_tag: Arc::new(AtomicU64::new(1)),
    };
    (producer, QueueConsumer { rx })
}

/// Publishing side. Clones publish to the same queue; the consumer stops
/// once every clone has been dropped.
#[derive(Debug, Clone)]
pub struct QueueProducer {
    tx: mpsc::Sender<Delivery>,
    next_tag: Arc<AtomicU64>,
}

impl QueueProducer {
    /// Serializes and publishes each message in order, waiting for room
    /// when the queue is full. Returns how many were published.
    ///
    /// # Errors
    ///
    /// Stops at the first message that fails to serialize or when the
    /// consumer has gone away.
    pub async fn publish(&self, batch: &[MessageDto]) -> Result<usize, QueueError> {
        for dto in batch {
            let body = serde_json::to_string(dto)?;
            self.publish_raw(body).await?;
        }
        tracing::info!(queue = QUEUE_NAME, count = batch.len(), "published messages");
        Ok(batch.len())
    }

    /// Publishes a body as is, without checking that it is a message.
    pub async fn publish_raw(&self, body: String) -> Result<u64, QueueError> {
        let tag = self.next_tag.fetch_add(1, Ordering::Relaxed);
        self.tx
            .send(Delivery { tag, body })
            .await
            .map_err(|_| QueueError::Closed(QUEUE_NAME))?;
        Ok(tag)
    }
}

/// A message the consumer left unacknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnackedMessage {
    pub tag: u64,
    pub reason: String,
}

/// What a consumer did before its queue closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    pub received: usize,
    /// Acknowledged and delivered by some backend.
    pub delivered: usize,
    /// Acknowledged although every backend failed.
    pub undelivered: usize,
    pub unacked: Vec<UnackedMessage>,
}

impl ConsumerReport {
    /// Messages acknowledged, delivered or not.
    pub fn acked(&self) -> usize {
        self.delivered + self.undelivered
    }
}

/// Consuming side.
#[derive(Debug)]
pub struct QueueConsumer {
    rx: mpsc::Receiver<Delivery>,
}

impl QueueConsumer {
    /// Feeds every message to `failover` until the queue closes.
    ///
    /// Messages are handled strictly one after another.
    pub async fn run<F>(mut self, failover: F) -> ConsumerReport
    where
        F: Failover + 'static,
    {
        tracing::info!(queue = QUEUE_NAME, "waiting for messages");

        let failover = Arc::new(Mutex::new(failover));
        let mut report = ConsumerReport::default();

        while let Some(delivery) = self.rx.recv().await {
            report.received += 1;
            let tag = delivery.tag;

            let message = match serde_json::from_str::<MessageDto>(&delivery.body) {
                Ok(dto) => Message::from(dto),
                Err(err) => {
                    tracing::error!(tag, error = %err, "dropping malformed message");
                    report.unacked.push(UnackedMessage {
                        tag,
                        reason: format!("malformed message: {err}"),
                    });
                    continue;
                }
            };
            tracing::info!(tag, subject = %message.subject(), "received message");

            let shared = Arc::clone(&failover);
            let outcome =
                tokio::task::spawn_blocking(move || shared.blocking_lock().send(&message)).await;

            match outcome {
                Ok(Ok(true)) => {
                    report.delivered += 1;
                    tracing::info!(tag, "acknowledged");
                }
                Ok(Ok(false)) => {
                    report.undelivered += 1;
                    tracing::warn!(tag, "acknowledged without delivery");
                }
                Ok(Err(err)) => {
                    tracing::error!(tag, error = %err, "failover gave up, leaving unacknowledged");
                    report.unacked.push(UnackedMessage {
                        tag,
                        reason: err.to_string(),
                    });
                }
                Err(err) => {
                    tracing::error!(tag, error = %err, "delivery task failed, leaving unacknowledged");
                    report.unacked.push(UnackedMessage {
                        tag,
                        reason: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            queue = QUEUE_NAME,
            received = report.received,
            acked = report.acked(),
            unacked = report.unacked.len(),
            "queue closed"
        );
        report
    }
}
