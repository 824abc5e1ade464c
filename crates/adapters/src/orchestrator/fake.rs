// SPDX-License-Identifier: MIT

//! In-memory [`OrchestratorAdapter`] for Gateway/Worker/Reaper unit tests.

use super::{
    DeleteOutcome, OrchestratorAdapter, OrchestratorError, SandboxPhase, SandboxSpec, SandboxStatus,
    WatchOutcome,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
pub struct FakeOrchestratorAdapter {
    pods: Arc<Mutex<HashMap<String, SandboxStatus>>>,
    unavailable: Arc<Mutex<bool>>,
    /// Names that should never become addressable, simulating a sandbox
    /// that never starts (used to exercise the Worker's timeout path).
    never_ready: Arc<Mutex<std::collections::HashSet<String>>>,
}

impl FakeOrchestratorAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    pub fn mark_never_ready(&self, name: &str) {
        self.never_ready.lock().insert(name.to_string());
    }

    /// Test helper: simulate the pod reaching `Running` with an IP, as if
    /// a kubelet had scheduled it.
    pub fn mark_running(&self, name: &str, pod_ip: &str) {
        self.pods.lock().insert(
            name.to_string(),
            SandboxStatus { phase: SandboxPhase::Running, pod_ip: Some(pod_ip.to_string()) },
        );
    }

    pub fn exists(&self, name: &str) -> bool {
        self.pods.lock().contains_key(name)
    }

    fn check_available(&self) -> Result<(), OrchestratorError> {
        if *self.unavailable.lock() {
            Err(OrchestratorError::Unavailable("fake orchestrator offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl OrchestratorAdapter for FakeOrchestratorAdapter {
    async fn get_status(&self, name: &str) -> Result<Option<SandboxStatus>, OrchestratorError> {
        self.check_available()?;
        Ok(self.pods.lock().get(name).cloned())
    }

    async fn create(&self, spec: &SandboxSpec) -> Result<(), OrchestratorError> {
        self.check_available()?;
        self.pods
            .lock()
            .entry(spec.name.clone())
            .or_insert(SandboxStatus { phase: SandboxPhase::Pending, pod_ip: None });
        Ok(())
    }

    async fn wait_until_addressable(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<WatchOutcome, OrchestratorError> {
        self.check_available()?;
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(status) = self.pods.lock().get(name) {
                if status.is_addressable() {
                    return Ok(WatchOutcome::Ready);
                }
            }
            if self.never_ready.lock().contains(name) || tokio::time::Instant::now() >= deadline {
                return Ok(WatchOutcome::TimedOut);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn delete(&self, name: &str) -> Result<DeleteOutcome, OrchestratorError> {
        self.check_available()?;
        if self.pods.lock().remove(name).is_some() {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::AlreadyAbsent)
        }
    }
}
