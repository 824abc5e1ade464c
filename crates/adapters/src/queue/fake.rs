// SPDX-License-Identifier: MIT

//! In-memory [`QueueAdapter`] for Gateway/Worker unit tests.

use super::{Acker, QueueAdapter, QueueDelivery, QueueError};
use async_trait::async_trait;
use parking_lot::Mutex;
use sessiond_core::queue::ProvisionMessage;
use sessiond_core::session::UserId;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Clone, Default)]
pub struct FakeQueueAdapter {
    messages: Arc<Mutex<VecDeque<ProvisionMessage>>>,
    notify: Arc<Notify>,
    /// When set, every publish fails with `QueueError::Unavailable`.
    unavailable: Arc<Mutex<bool>>,
}

impl FakeQueueAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl QueueAdapter for FakeQueueAdapter {
    async fn publish(&self, message: &ProvisionMessage) -> Result<(), QueueError> {
        if *self.unavailable.lock() {
            return Err(QueueError::Unavailable("fake broker offline".to_string()));
        }
        self.messages.lock().push_back(message.clone());
        self.notify.notify_one();
        Ok(())
    }

    async fn recv(&self) -> Result<QueueDelivery, QueueError> {
        loop {
            if let Some(message) = self.messages.lock().pop_front() {
                return Ok(QueueDelivery::new(message, Box::new(NoopAcker)));
            }
            self.notify.notified().await;
        }
    }
}

struct NoopAcker;

#[async_trait]
impl Acker for NoopAcker {
    async fn ack(&self) -> Result<(), QueueError> {
        Ok(())
    }

    async fn nack(&self) -> Result<(), QueueError> {
        Ok(())
    }
}
