// SPDX-License-Identifier: MIT

//! Pod spec construction for sandbox pods.

use super::SandboxSpec;
use k8s_openapi::api::core::v1::{Container, ContainerPort, Pod, PodSpec};

const APP_LABEL: &str = "session-pod";

/// Build a Pod spec for a sandbox (SPEC_FULL §4.C).
///
/// One container, no probes, `restartPolicy: Never` — the sandbox's
/// readiness is observed externally via [`super::OrchestratorAdapter::
/// wait_until_addressable`] rather than a Kubernetes probe.
pub(super) fn build_pod(spec: &SandboxSpec, namespace: &str) -> Pod {
    let container = Container {
        name: "web-container".to_string(),
        image: Some(spec.image.clone()),
        ports: Some(vec![ContainerPort { container_port: spec.container_port, ..Default::default() }]),
        ..Default::default()
    };

    Pod {
        metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
            name: Some(spec.name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(
                [("app".to_string(), APP_LABEL.to_string()), ("user_id".to_string(), spec.name.clone())]
                    .into_iter()
                    .collect(),
            ),
            annotations: Some(
                [("original_id".to_string(), spec.original_id.clone())].into_iter().collect(),
            ),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![container],
            restart_policy: Some("Never".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
