// SPDX-License-Identifier: MIT

//! Per-message reconciliation (SPEC_FULL §4.D): the Worker's only unit of
//! work. One call per queue delivery; the caller acks unconditionally
//! afterwards regardless of the outcome (step 3 — acking is not this
//! module's concern, see [`crate::run`]).

use sessiond_adapters::{OrchestratorAdapter, OrchestratorError, SandboxSpec, StateStoreAdapter, WatchOutcome};
use sessiond_core::sanitize::sandbox_name;
use sessiond_core::session::UserId;
use sessiond_core::Clock;
use tracing::{info, warn};

use crate::config::Config;

/// What step 2 of SPEC_FULL §4.D actually did, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Sandbox was already `Running` with an address; session written `ready`.
    AlreadyRunning,
    /// Sandbox exists but isn't `Running` yet; left alone (§9 open question).
    LeftInFlight,
    /// Sandbox was absent, created, and became addressable in time.
    Provisioned,
    /// Sandbox was absent, created, but did not become addressable before
    /// the watch timeout; session written `failed`.
    TimedOut,
}

/// Reconciles the sandbox for `user_id` against desired state, per SPEC_FULL
/// §4.D step 2. Errors are not retried here — the Worker logs and acks
/// regardless (step 3); this function surfaces the error so the caller can
/// log it with full context.
pub async fn reconcile<S, O, C>(
    store: &S,
    orchestrator: &O,
    clock: &C,
    user_id: &UserId,
    config: &Config,
) -> Result<ReconcileOutcome, OrchestratorError>
where
    S: StateStoreAdapter + ?Sized,
    O: OrchestratorAdapter + ?Sized,
    C: Clock,
{
    let name = sandbox_name(user_id.as_str());

    match orchestrator.get_status(&name).await? {
        Some(status) if status.is_addressable() => {
            // `is_addressable` guarantees `pod_ip` is `Some`.
            let addr = status.pod_ip.unwrap_or_default();
            let now = clock.unix_time_secs();
            if let Err(e) = store.put_ready(user_id, &addr, now).await {
                warn!(%user_id, %name, error = %e, "sandbox running but failed to write ready record");
            } else {
                info!(%user_id, %name, %addr, "session ready");
            }
            Ok(ReconcileOutcome::AlreadyRunning)
        }

        Some(_other_phase) => {
            // Another worker or a prior attempt is progressing this
            // sandbox. Leave the session as-is (§9 open question decision).
            info!(%user_id, %name, "sandbox exists but not yet running, leaving in flight");
            Ok(ReconcileOutcome::LeftInFlight)
        }

        None => {
            let spec = SandboxSpec {
                name: name.clone(),
                original_id: user_id.as_str().to_string(),
                image: config.sandbox_image.clone(),
                container_port: config.sandbox_port,
            };
            orchestrator.create(&spec).await?;

            match orchestrator.wait_until_addressable(&name, config.watch_timeout).await? {
                WatchOutcome::Ready => {
                    let addr = orchestrator
                        .get_status(&name)
                        .await?
                        .and_then(|s| s.pod_ip)
                        .unwrap_or_default();
                    let now = clock.unix_time_secs();
                    if let Err(e) = store.put_ready(user_id, &addr, now).await {
                        warn!(%user_id, %name, error = %e, "provisioned but failed to write ready record");
                    } else {
                        info!(%user_id, %name, %addr, "session ready");
                    }
                    Ok(ReconcileOutcome::Provisioned)
                }
                WatchOutcome::TimedOut => {
                    warn!(%user_id, %name, "sandbox did not become addressable before watch timeout");
                    if let Err(e) = store.put_failed(user_id).await {
                        warn!(%user_id, %name, error = %e, "failed to write failed record");
                    }
                    Ok(ReconcileOutcome::TimedOut)
                }
            }
        }
    }
}
