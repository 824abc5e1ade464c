// SPDX-License-Identifier: MIT

//! Redis-backed implementation of [`StateStoreAdapter`].
//!
//! Session records are Redis hashes keyed by `session:<user_id>` (SPEC_FULL
//! §3/§6). Every write that must touch more than one field goes through a
//! single `HSET` call, which Redis executes atomically — there is no
//! multi-key transaction and no compare-and-swap (SPEC_FULL §5), so every
//! invariant in this system is enforced by idempotent convergence rather
//! than mutual exclusion.

use super::{StateStoreAdapter, StoreError};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use sessiond_core::session::{SessionRecord, SessionStatus, UserId};
use std::time::Duration;
use tracing::{info, warn};

const SESSION_PREFIX: &str = "session:*";

#[derive(Clone)]
pub struct RedisStateStore {
    conn: ConnectionManager,
}

impl RedisStateStore {
    /// Connects to Redis, retrying with a fixed 5s backoff until it
    /// succeeds (SPEC_FULL §7: `StoreUnavailable` startup recovery policy).
    pub async fn connect(host: &str, password: &str) -> Self {
        let url = format!("redis://:{password}@{host}/0");
        loop {
            match Self::try_connect(&url).await {
                Ok(conn) => {
                    info!(%host, "connected to state store");
                    return Self { conn };
                }
                Err(e) => {
                    warn!(%host, error = %e, "state store not ready, retrying in 5s");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    async fn try_connect(url: &str) -> Result<ConnectionManager, StoreError> {
        let client = redis::Client::open(url).map_err(|e| StoreError::Other(e.to_string()))?;
        client.get_connection_manager().await.map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn map_err(e: redis::RedisError) -> StoreError {
        if e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Other(e.to_string())
        }
    }
}

#[async_trait]
impl StateStoreAdapter for RedisStateStore {
    async fn get_session(&self, user_id: &UserId) -> Result<Option<SessionRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let fields: std::collections::HashMap<String, String> =
            conn.hgetall(user_id.session_key()).await.map_err(Self::map_err)?;

        if fields.is_empty() {
            return Ok(None);
        }

        let status = fields
            .get("status")
            .and_then(|s| SessionStatus::parse(s))
            .ok_or_else(|| StoreError::Other(format!("corrupt session record for {user_id}")))?;

        Ok(Some(SessionRecord {
            status,
            addr: fields.get("addr").filter(|a| !a.is_empty()).cloned(),
            last_active: fields.get("last_active").and_then(|s| s.parse().ok()),
            created_at: fields.get("created_at").and_then(|s| s.parse().ok()),
        }))
    }

    async fn put_initiating(&self, user_id: &UserId, now: u64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.hset_multiple(
            user_id.session_key(),
            &[("status", "initiating".to_string()), ("created_at", now.to_string())],
        )
        .await
        .map_err(Self::map_err)
    }

    async fn put_failed(&self, user_id: &UserId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.hset_multiple(
            user_id.session_key(),
            &[("status", "failed".to_string()), ("addr", String::new())],
        )
        .await
        .map_err(Self::map_err)
    }

    async fn put_ready(&self, user_id: &UserId, addr: &str, now: u64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.hset_multiple(
            user_id.session_key(),
            &[
                ("status", "ready".to_string()),
                ("addr", addr.to_string()),
                ("last_active", now.to_string()),
            ],
        )
        .await
        .map_err(Self::map_err)
    }

    async fn touch(&self, user_id: &UserId, now: u64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.hset(user_id.session_key(), "last_active", now.to_string())
            .await
            .map_err(Self::map_err)
    }

    async fn delete_session(&self, user_id: &UserId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(user_id.session_key()).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn scan_sessions(&self) -> Result<Vec<UserId>, StoreError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(SESSION_PREFIX).await.map_err(Self::map_err)?;
        Ok(keys.iter().filter_map(|k| UserId::from_session_key(k)).collect())
    }
}
