// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sessiond-adapters: typed wrappers around the three external collaborators
//! named in SPEC_FULL §1 as out-of-scope-by-interface-only: the state
//! store, the message broker, and the container orchestrator.
//!
//! Each concern gets a trait (for testability) plus a production
//! implementation against a real client library, plus (behind
//! `test-support`) an in-memory fake used by the Gateway/Worker/Reaper's
//! own test suites.

pub mod orchestrator;
pub mod queue;
pub mod store;

pub use orchestrator::{
    DeleteOutcome, KubeOrchestratorAdapter, OrchestratorAdapter, OrchestratorError, SandboxPhase,
    SandboxSpec, SandboxStatus, WatchOutcome,
};
pub use queue::{AmqpQueueAdapter, QueueAdapter, QueueDelivery, QueueError};
pub use store::{RedisStateStore, StateStoreAdapter, StoreError};

#[cfg(any(test, feature = "test-support"))]
pub use orchestrator::fake::FakeOrchestratorAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use queue::fake::FakeQueueAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use store::fake::FakeStateStoreAdapter;
