// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sessiond-reaper: idle-timeout eviction (SPEC_FULL §4.E).
//!
//! [`tick::run_tick`] is the testable core, called once per period by
//! [`run`] from the binary's `tokio::time::interval` loop.

pub mod config;
pub mod tick;

use config::Config;
use sessiond_adapters::{OrchestratorAdapter, StateStoreAdapter};
use sessiond_core::Clock;
use std::future::Future;
use tracing::info;

/// Runs the tick loop on `config.reaper_period` until `shutdown` resolves.
pub async fn run<S, O, C>(
    store: &S,
    orchestrator: &O,
    clock: &C,
    config: &Config,
    shutdown: impl Future<Output = ()>,
) where
    S: StateStoreAdapter + ?Sized,
    O: OrchestratorAdapter + ?Sized,
    C: Clock,
{
    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(config.reaper_period);
    // The first tick fires immediately; that is the desired behavior (a
    // freshly-started reaper should not wait a full period before its
    // first sweep).

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutdown signal received");
                return;
            }
            _ = interval.tick() => {
                tick::run_tick(store, orchestrator, clock, config).await;
            }
        }
    }
}
