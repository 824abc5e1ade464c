// SPDX-License-Identifier: MIT

//! Orchestrator Adapter (SPEC_FULL §4.C): sandbox pod lifecycle against
//! Kubernetes.
//!
//! # Module layout
//!
//! - [`pod`] — Pod spec construction helpers
//! - [`kube_orchestrator`] — production implementation against `kube-rs`
//! - [`fake`] — in-memory implementation for tests

mod pod;

mod kube_orchestrator;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use kube_orchestrator::KubeOrchestratorAdapter;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the orchestrator adapter.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("orchestrator unavailable: {0}")]
    Unavailable(String),
    #[error("orchestrator error: {0}")]
    Other(String),
}

/// Parameters needed to create a sandbox pod (SPEC_FULL §4.C).
#[derive(Debug, Clone)]
pub struct SandboxSpec {
    /// The sanitized, DNS-label-safe name (see [`sessiond_core::sanitize`]).
    pub name: String,
    /// The original, unsanitized identity, kept as an annotation so the
    /// pod can be traced back to its owner.
    pub original_id: String,
    pub image: String,
    pub container_port: i32,
}

/// Coarse phase of a sandbox pod, as reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxPhase {
    Pending,
    Running,
    Other,
}

/// Snapshot of a sandbox's current state.
#[derive(Debug, Clone)]
pub struct SandboxStatus {
    pub phase: SandboxPhase,
    pub pod_ip: Option<String>,
}

impl SandboxStatus {
    pub fn is_addressable(&self) -> bool {
        self.phase == SandboxPhase::Running && self.pod_ip.is_some()
    }
}

/// Outcome of a delete request, distinguishing "already gone" from an
/// actual deletion (SPEC_FULL §4.E: the Reaper treats both as success).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

/// Outcome of waiting for a sandbox to become addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Ready,
    TimedOut,
}

/// Sandbox pod lifecycle: create, inspect, wait, delete (SPEC_FULL §4.C).
#[async_trait]
pub trait OrchestratorAdapter: Send + Sync {
    /// Returns the current status of the named sandbox, or `None` if no
    /// such pod exists.
    async fn get_status(&self, name: &str) -> Result<Option<SandboxStatus>, OrchestratorError>;

    /// Creates the sandbox pod. Must not error if a pod with this name
    /// already exists — the Worker checks [`get_status`] first, but a
    /// create immediately after a concurrent create from another worker
    /// is possible and treated as success.
    async fn create(&self, spec: &SandboxSpec) -> Result<(), OrchestratorError>;

    /// Blocks (via a native watch, not polling) until the named pod
    /// reports `Running` with a pod IP, or `timeout` elapses.
    async fn wait_until_addressable(
        &self,
        name: &str,
        timeout: std::time::Duration,
    ) -> Result<WatchOutcome, OrchestratorError>;

    /// Deletes the named sandbox pod. A 404 from the underlying API is
    /// reported as [`DeleteOutcome::AlreadyAbsent`], not an error.
    async fn delete(&self, name: &str) -> Result<DeleteOutcome, OrchestratorError>;
}
