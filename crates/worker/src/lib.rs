// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sessiond-worker: the Lifecycle Worker (SPEC_FULL §4.D).
//!
//! Consumes provisioning messages from the durable queue one at a time and
//! reconciles sandbox existence with desired state in the orchestrator.
//! [`reconcile`] is the testable core; [`run`] wraps it in the
//! consume-ack-repeat loop the binary actually runs.

pub mod config;
pub mod reconcile;

use config::Config;
use reconcile::reconcile;
use sessiond_adapters::{OrchestratorAdapter, QueueAdapter, QueueError, StateStoreAdapter};
use sessiond_core::Clock;
use std::future::Future;
use tracing::{info, warn};

/// Runs the consume loop until `shutdown` resolves.
///
/// Graceful shutdown (SPEC_FULL §4.D ambient stack / §5): a message already
/// being reconciled is always finished and acked before the loop re-checks
/// `shutdown`, matching the reference's "finish acking the current message,
/// then exit".
pub async fn run<S, Q, O, C>(
    store: &S,
    queue: &Q,
    orchestrator: &O,
    clock: &C,
    config: &Config,
    shutdown: impl Future<Output = ()>,
) where
    S: StateStoreAdapter + ?Sized,
    Q: QueueAdapter + ?Sized,
    O: OrchestratorAdapter + ?Sized,
    C: Clock,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutdown signal received, draining in-flight message");
                return;
            }
            delivery = queue.recv() => {
                match delivery {
                    Ok(delivery) => {
                        let user_id = delivery.message.user_id();
                        match reconcile(store, orchestrator, clock, &user_id, config).await {
                            Ok(outcome) => info!(%user_id, ?outcome, "reconciled"),
                            Err(e) => warn!(%user_id, error = %e, "reconcile failed, acking anyway"),
                        }
                        // Step 3: ack unconditionally after the attempt above,
                        // whether or not reconciliation succeeded (SPEC_FULL
                        // §4.D: at-least-once + non-idempotent upstream
                        // effects is avoided by acking rather than retrying).
                        if let Err(e) = delivery.ack().await {
                            warn!(%user_id, error = %e, "failed to ack message");
                        }
                    }
                    Err(QueueError::Unavailable(e)) => {
                        warn!(error = %e, "broker unavailable, retrying in 5s");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                    Err(QueueError::Other(e)) => {
                        warn!(error = %e, "queue error, retrying in 5s");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }
            }
        }
    }
}
