// SPDX-License-Identifier: MIT

//! Queue Adapter (SPEC_FULL §4.B): durable publish + consume-with-ack
//! against the `pod_creation_queue`.

mod amqp;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use amqp::AmqpQueueAdapter;

use async_trait::async_trait;
use sessiond_core::queue::ProvisionMessage;
use thiserror::Error;

/// Errors from the queue adapter.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("message broker unavailable: {0}")]
    Unavailable(String),
    #[error("message broker error: {0}")]
    Other(String),
}

/// Durable publish + consume-with-ack against a named work queue
/// (SPEC_FULL §4.B).
#[async_trait]
pub trait QueueAdapter: Send + Sync {
    /// Publishes a message durably. Must not return `Ok` unless the broker
    /// has accepted it (persistent delivery mode).
    async fn publish(&self, message: &ProvisionMessage) -> Result<(), QueueError>;

    /// Blocks until the next message is available. At-least-once delivery
    /// is assumed by the broker; callers must treat [`QueueDelivery::ack`]
    /// as the only way to prevent redelivery.
    async fn recv(&self) -> Result<QueueDelivery, QueueError>;
}

/// A single delivered message plus its acknowledgement handle.
///
/// Messages that fail to decode as [`ProvisionMessage`] are acked
/// immediately by the adapter before ever reaching the caller (poison-pill
/// avoidance, SPEC_FULL §9 REDESIGN FLAGS) — `recv` only returns messages
/// that decoded successfully.
pub struct QueueDelivery {
    pub message: ProvisionMessage,
    acker: Box<dyn Acker>,
}

impl QueueDelivery {
    pub fn new(message: ProvisionMessage, acker: Box<dyn Acker>) -> Self {
        Self { message, acker }
    }

    /// Acknowledges the message so the broker will not redeliver it.
    pub async fn ack(self) -> Result<(), QueueError> {
        self.acker.ack().await
    }

    /// Negatively acknowledges the message. The Worker's contract
    /// (SPEC_FULL §4.D step 3) acks unconditionally after processing, so
    /// this is exposed for completeness and used only by adapter-level
    /// tests.
    pub async fn nack(self) -> Result<(), QueueError> {
        self.acker.nack().await
    }
}

#[async_trait]
pub trait Acker: Send + Sync {
    async fn ack(&self) -> Result<(), QueueError>;
    async fn nack(&self) -> Result<(), QueueError>;
}
