// SPDX-License-Identifier: MIT

//! In-memory [`StateStoreAdapter`] for Gateway/Worker/Reaper unit tests.

use super::{StateStoreAdapter, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use sessiond_core::session::{SessionRecord, UserId};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct FakeStateStoreAdapter {
    records: Arc<Mutex<HashMap<UserId, SessionRecord>>>,
    /// When set, every operation fails with `StoreError::Unavailable`.
    unavailable: Arc<Mutex<bool>>,
}

impl FakeStateStoreAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if *self.unavailable.lock() {
            Err(StoreError::Unavailable("fake store offline".to_string()))
        } else {
            Ok(())
        }
    }

    /// Test helper: seed a record directly, bypassing the normal writes.
    pub fn seed(&self, user_id: &UserId, record: SessionRecord) {
        self.records.lock().insert(user_id.clone(), record);
    }
}

#[async_trait]
impl StateStoreAdapter for FakeStateStoreAdapter {
    async fn get_session(&self, user_id: &UserId) -> Result<Option<SessionRecord>, StoreError> {
        self.check_available()?;
        Ok(self.records.lock().get(user_id).cloned())
    }

    async fn put_initiating(&self, user_id: &UserId, now: u64) -> Result<(), StoreError> {
        self.check_available()?;
        self.records.lock().insert(user_id.clone(), SessionRecord::initiating(now));
        Ok(())
    }

    async fn put_failed(&self, user_id: &UserId) -> Result<(), StoreError> {
        self.check_available()?;
        self.records.lock().insert(user_id.clone(), SessionRecord::failed());
        Ok(())
    }

    async fn put_ready(&self, user_id: &UserId, addr: &str, now: u64) -> Result<(), StoreError> {
        self.check_available()?;
        self.records.lock().insert(user_id.clone(), SessionRecord::ready(addr, now));
        Ok(())
    }

    async fn touch(&self, user_id: &UserId, now: u64) -> Result<(), StoreError> {
        self.check_available()?;
        let mut records = self.records.lock();
        if let Some(record) = records.get_mut(user_id) {
            record.last_active = Some(now);
        }
        Ok(())
    }

    async fn delete_session(&self, user_id: &UserId) -> Result<(), StoreError> {
        self.check_available()?;
        self.records.lock().remove(user_id);
        Ok(())
    }

    async fn scan_sessions(&self) -> Result<Vec<UserId>, StoreError> {
        self.check_available()?;
        Ok(self.records.lock().keys().cloned().collect())
    }
}
