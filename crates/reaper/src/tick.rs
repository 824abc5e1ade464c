// SPDX-License-Identifier: MIT

//! One reaper tick (SPEC_FULL §4.E): scan, classify, reap.

use sessiond_adapters::{DeleteOutcome, OrchestratorAdapter, StateStoreAdapter};
use sessiond_core::sanitize::sandbox_name;
use sessiond_core::session::{SessionStatus, UserId};
use sessiond_core::Clock;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Why a session was or wasn't reaped this tick, for the per-tick summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// `idle = now - last_active` exceeded `IDLE_TIMEOUT`.
    ReapedIdle,
    /// `initiating` with no `last_active`, older than `2 × LONG_POLL_BOUND`
    /// (SPEC_FULL §4.E REDESIGN / §9 open-question decision).
    ReapedOrphan,
    /// Still within its idle budget or not yet old enough to be an orphan.
    Skipped,
    /// The record vanished between `scan_sessions` and the per-record read
    /// (another reaper replica, or the long-poll path, got there first).
    Gone,
}

/// Aggregate result of one tick, logged at `info` per SPEC_FULL §4.E
/// ambient stack.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub scanned: usize,
    pub reaped: usize,
    pub skipped: usize,
}

/// Runs one reaper tick against every session the store currently knows
/// about (SPEC_FULL §4.E steps 1-4).
pub async fn run_tick<S, O, C>(
    store: &S,
    orchestrator: &O,
    clock: &C,
    config: &Config,
) -> TickSummary
where
    S: StateStoreAdapter + ?Sized,
    O: OrchestratorAdapter + ?Sized,
    C: Clock,
{
    let identities = match store.scan_sessions().await {
        Ok(ids) => ids,
        Err(e) => {
            warn!(error = %e, "failed to scan sessions, skipping this tick");
            return TickSummary::default();
        }
    };

    let mut summary = TickSummary { scanned: identities.len(), ..Default::default() };

    for user_id in identities {
        match reap_one(store, orchestrator, clock, config, &user_id).await {
            SessionOutcome::ReapedIdle | SessionOutcome::ReapedOrphan => summary.reaped += 1,
            SessionOutcome::Skipped | SessionOutcome::Gone => summary.skipped += 1,
        }
    }

    info!(scanned = summary.scanned, reaped = summary.reaped, skipped = summary.skipped, "reaper tick complete");
    summary
}

async fn reap_one<S, O, C>(
    store: &S,
    orchestrator: &O,
    clock: &C,
    config: &Config,
    user_id: &UserId,
) -> SessionOutcome
where
    S: StateStoreAdapter + ?Sized,
    O: OrchestratorAdapter + ?Sized,
    C: Clock,
{
    let record = match store.get_session(user_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return SessionOutcome::Gone,
        Err(e) => {
            warn!(%user_id, error = %e, "failed to read session, skipping this tick");
            return SessionOutcome::Skipped;
        }
    };

    let now = clock.unix_time_secs();

    let outcome = if let Some(last_active) = record.last_active {
        let idle = now.saturating_sub(last_active);
        if idle > config.idle_timeout.as_secs() {
            Some(SessionOutcome::ReapedIdle)
        } else {
            debug!(%user_id, idle, "within idle budget, skipping");
            None
        }
    } else if record.status == SessionStatus::Initiating {
        match record.created_at {
            Some(created_at) if now.saturating_sub(created_at) > config.orphan_threshold().as_secs() => {
                Some(SessionOutcome::ReapedOrphan)
            }
            _ => {
                // A fresh creation still in flight must not be raced
                // (SPEC_FULL §4.E: "never evicts ... to avoid racing the
                // long-poll creation path").
                None
            }
        }
    } else {
        None
    };

    let Some(outcome) = outcome else {
        return SessionOutcome::Skipped;
    };

    let name = sandbox_name(user_id.as_str());
    match orchestrator.delete(&name).await {
        Ok(DeleteOutcome::Deleted) => info!(%user_id, %name, ?outcome, "reaped"),
        Ok(DeleteOutcome::AlreadyAbsent) => info!(%user_id, %name, ?outcome, "reaped (sandbox already gone)"),
        Err(e) => {
            // I4 / §4.E: on a non-not-found error, skip the record deletion
            // and retry next tick rather than orphaning a live sandbox.
            warn!(%user_id, %name, error = %e, "sandbox delete failed, retrying next tick");
            return SessionOutcome::Skipped;
        }
    }

    if let Err(e) = store.delete_session(user_id).await {
        warn!(%user_id, error = %e, "failed to delete session record after sandbox delete");
    }

    outcome
}
