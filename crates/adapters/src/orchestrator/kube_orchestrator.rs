// SPDX-License-Identifier: MIT

//! Production [`OrchestratorAdapter`] against the Kubernetes API.

use super::pod::build_pod;
use super::{DeleteOutcome, OrchestratorError, SandboxPhase, SandboxSpec, SandboxStatus, WatchOutcome};
use async_trait::async_trait;
use futures_util::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, PostParams, WatchEvent, WatchParams};
use kube::{Client, Error as KubeError};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Clone)]
pub struct KubeOrchestratorAdapter {
    client: Client,
    namespace: String,
}

impl KubeOrchestratorAdapter {
    pub async fn connect(namespace: &str) -> Result<Self, OrchestratorError> {
        let client = Client::try_default()
            .await
            .map_err(|e| OrchestratorError::Unavailable(format!("failed to create kube client: {e}")))?;
        Ok(Self { client, namespace: namespace.to_string() })
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn status_of(pod: &Pod) -> SandboxStatus {
        let phase = pod
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .map(|p| if p == "Running" { SandboxPhase::Running } else { SandboxPhase::Pending })
            .unwrap_or(SandboxPhase::Pending);
        let pod_ip = pod.status.as_ref().and_then(|s| s.pod_ip.clone());
        SandboxStatus { phase, pod_ip }
    }

    fn map_err(e: KubeError) -> OrchestratorError {
        OrchestratorError::Other(e.to_string())
    }
}

#[async_trait]
impl super::OrchestratorAdapter for KubeOrchestratorAdapter {
    async fn get_status(&self, name: &str) -> Result<Option<SandboxStatus>, OrchestratorError> {
        match self.pods().get(name).await {
            Ok(pod) => Ok(Some(Self::status_of(&pod))),
            Err(KubeError::Api(e)) if e.code == 404 => Ok(None),
            Err(e) => Err(Self::map_err(e)),
        }
    }

    async fn create(&self, spec: &SandboxSpec) -> Result<(), OrchestratorError> {
        let pod_spec = build_pod(spec, &self.namespace);
        info!(name = %spec.name, namespace = %self.namespace, "creating sandbox pod");
        match self.pods().create(&PostParams::default(), &pod_spec).await {
            Ok(_) => Ok(()),
            // A concurrent create from another worker racing on the same
            // sanitized name is not an error (SPEC_FULL §4.D).
            Err(KubeError::Api(e)) if e.code == 409 => Ok(()),
            Err(e) => Err(Self::map_err(e)),
        }
    }

    async fn wait_until_addressable(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<WatchOutcome, OrchestratorError> {
        if let Some(status) = self.get_status(name).await? {
            if status.is_addressable() {
                return Ok(WatchOutcome::Ready);
            }
        }

        let wp = WatchParams::default()
            .fields(&format!("metadata.name={name}"))
            .timeout(timeout.as_secs() as u32);
        let mut stream = self
            .pods()
            .watch(&wp, "0")
            .await
            .map_err(Self::map_err)?
            .boxed();

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(WatchOutcome::TimedOut);
            }

            let next = tokio::time::timeout(remaining, stream.next()).await;
            let event = match next {
                Ok(Some(Ok(event))) => event,
                Ok(Some(Err(e))) => return Err(Self::map_err(e)),
                Ok(None) => return Ok(WatchOutcome::TimedOut),
                Err(_) => return Ok(WatchOutcome::TimedOut),
            };

            let pod = match event {
                WatchEvent::Added(pod) | WatchEvent::Modified(pod) => pod,
                WatchEvent::Deleted(_) => {
                    return Err(OrchestratorError::Other(format!("pod {name} deleted while waiting")))
                }
                WatchEvent::Bookmark(_) => continue,
                WatchEvent::Error(e) => {
                    warn!(%name, error = %e.message, "watch error while waiting for sandbox");
                    continue;
                }
            };

            if Self::status_of(&pod).is_addressable() {
                return Ok(WatchOutcome::Ready);
            }
        }
    }

    async fn delete(&self, name: &str) -> Result<DeleteOutcome, OrchestratorError> {
        match self.pods().delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(KubeError::Api(e)) if e.code == 404 => Ok(DeleteOutcome::AlreadyAbsent),
            Err(e) => Err(Self::map_err(e)),
        }
    }
}
