// SPDX-License-Identifier: MIT

//! The provisioning queue's message schema (SPEC_FULL §3, §6).

use crate::session::UserId;
use serde::{Deserialize, Serialize};

/// Durable queue message published by the Gateway and consumed by the
/// Worker. Body is UTF-8 JSON `{"id": "<user_id>"}` (SPEC_FULL §6).
///
/// A typed decoder (this type, via `serde_json`) replaces the reference
/// implementation's duck-typed dict access (SPEC_FULL §9 REDESIGN FLAGS):
/// a message that fails to decode is dropped with an ack rather than
/// redelivered forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionMessage {
    pub id: String,
}

impl ProvisionMessage {
    pub fn for_user(user_id: &UserId) -> Self {
        Self { id: user_id.as_str().to_string() }
    }

    pub fn user_id(&self) -> UserId {
        UserId::new(&self.id)
    }

    pub fn encode(&self) -> Vec<u8> {
        // Infallible: the struct has no types that can fail to serialize.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
