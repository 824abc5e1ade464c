// SPDX-License-Identifier: MIT

//! State Store Adapter (SPEC_FULL §4.A): typed wrapper around the shared
//! key-value store holding session records.

mod redis_store;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use redis_store::RedisStateStore;

use async_trait::async_trait;
use sessiond_core::session::{SessionRecord, UserId};
use thiserror::Error;

/// Errors from the state-store adapter.
///
/// `Unavailable` is the one kind component logic branches on directly
/// (SPEC_FULL §7: `StoreUnavailable` → 503 in the Gateway, retry-with-
/// backoff in the Worker/Reaper); everything else is an unexpected
/// transport-level failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),
    #[error("state store error: {0}")]
    Other(String),
}

/// Typed wrapper around the key-value store's session-record CRUD and
/// scans (SPEC_FULL §4.A).
#[async_trait]
pub trait StateStoreAdapter: Send + Sync {
    /// Atomic multi-field read. `None` means the key is absent.
    async fn get_session(&self, user_id: &UserId) -> Result<Option<SessionRecord>, StoreError>;

    /// Writes `status=initiating` and `created_at=now` atomically
    /// (SPEC_FULL §4.A: supplement to the distilled `put_status` op, used
    /// for the Gateway's absent→initiating transition).
    async fn put_initiating(&self, user_id: &UserId, now: u64) -> Result<(), StoreError>;

    /// Writes `status=failed`, clearing `addr` and `created_at`. Used for
    /// the Worker's watch-timeout transition.
    async fn put_failed(&self, user_id: &UserId) -> Result<(), StoreError>;

    /// Writes `status=ready`, `addr`, and `last_active` atomically
    /// (single multi-field write).
    async fn put_ready(&self, user_id: &UserId, addr: &str, now: u64) -> Result<(), StoreError>;

    /// Writes `last_active` only.
    async fn touch(&self, user_id: &UserId, now: u64) -> Result<(), StoreError>;

    /// Deletes the session record. Idempotent: deleting an absent key is
    /// not an error.
    async fn delete_session(&self, user_id: &UserId) -> Result<(), StoreError>;

    /// Enumerates all identities with a session record.
    async fn scan_sessions(&self) -> Result<Vec<UserId>, StoreError>;
}
