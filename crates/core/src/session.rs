// SPDX-License-Identifier: MIT

//! The session record and its state machine (SPEC_FULL §3).

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// A user identity, taken verbatim from the `X-User-ID` request header.
///
/// Trusted as-is (SPEC_FULL §1 Non-goals: authentication is out of scope).
/// Backed by [`SmolStr`] since most identities are short enough to stay
/// inline, avoiding a heap allocation per request on the hot path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(SmolStr);

impl UserId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The session-record key for this identity: `session:<user_id>`.
    pub fn session_key(&self) -> String {
        format!("session:{}", self.0)
    }

    /// Recover the user identity from a `session:<user_id>` key, as produced
    /// by a state-store prefix scan.
    pub fn from_session_key(key: &str) -> Option<Self> {
        key.strip_prefix("session:").map(Self::new)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Position in the per-session state machine (SPEC_FULL §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initiating,
    Ready,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initiating => "initiating",
            SessionStatus::Ready => "ready",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initiating" => Some(SessionStatus::Initiating),
            "ready" => Some(SessionStatus::Ready),
            "failed" => Some(SessionStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One per active user identity, keyed by `session:<user_id>` in the state
/// store (SPEC_FULL §3).
///
/// `created_at` is a supplement to the distilled spec (SPEC_FULL §3 ambient
/// stack note / §4.E REDESIGN): it lets the Reaper distinguish a fresh
/// `initiating` record from an orphaned one without ever touching the
/// `status`/`addr`/`last_active` invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub status: SessionStatus,
    pub addr: Option<String>,
    pub last_active: Option<u64>,
    pub created_at: Option<u64>,
}

impl SessionRecord {
    pub fn initiating(now: u64) -> Self {
        Self { status: SessionStatus::Initiating, addr: None, last_active: None, created_at: Some(now) }
    }

    pub fn ready(addr: impl Into<String>, now: u64) -> Self {
        Self {
            status: SessionStatus::Ready,
            addr: Some(addr.into()),
            last_active: Some(now),
            created_at: None,
        }
    }

    pub fn failed() -> Self {
        Self { status: SessionStatus::Failed, addr: None, last_active: None, created_at: None }
    }

    /// I2: `status=ready ⇒ addr` is non-empty.
    pub fn satisfies_ready_invariant(&self) -> bool {
        match self.status {
            SessionStatus::Ready => self.addr.as_deref().is_some_and(|a| !a.is_empty()),
            _ => true,
        }
    }
}
