//! Reaper scenarios (SPEC_FULL §8), driven through
//! [`sessiond_reaper::tick::run_tick`] against fake adapters.

use crate::support::Harness;
use sessiond_core::session::{SessionRecord, UserId};

/// Scenario 5 (Idle reap): a `ready` record idle past the threshold is
/// reaped — sandbox deleted, record deleted — on a single tick.
#[tokio::test]
async fn idle_ready_session_is_reaped_on_one_tick() {
    let harness = Harness::new();
    let user = UserId::new("bob");
    let now = harness.clock.unix_time_secs();

    harness.orchestrator.mark_running("session-bob", "10.0.0.1");
    harness.store.seed(&user, SessionRecord::ready("10.0.0.1", now - 700));

    let summary = sessiond_reaper::tick::run_tick(
        &harness.store,
        &harness.orchestrator,
        &harness.clock,
        &harness.reaper_config(),
    )
    .await;

    assert_eq!(summary.reaped, 1);
    assert!(!harness.orchestrator.exists("session-bob"));
    assert!(harness.store.get_session(&user).await.unwrap().is_none());
}

/// I4: a sandbox that is already gone by the time the reaper gets to it
/// (e.g. manually deleted, or raced by another reaper replica) is still a
/// successful reap — `not_found` is not an error.
#[tokio::test]
async fn reap_of_already_deleted_sandbox_still_removes_record() {
    let harness = Harness::new();
    let user = UserId::new("frank");
    let now = harness.clock.unix_time_secs();

    // No matching call to `mark_running`: the fake orchestrator reports
    // this sandbox as absent, as if another reaper replica deleted it
    // first.
    harness.store.seed(&user, SessionRecord::ready("10.0.0.3", now - 700));

    let summary = sessiond_reaper::tick::run_tick(
        &harness.store,
        &harness.orchestrator,
        &harness.clock,
        &harness.reaper_config(),
    )
    .await;

    assert_eq!(summary.reaped, 1);
    assert!(harness.store.get_session(&user).await.unwrap().is_none());
}

/// A session well within its idle budget survives a tick untouched.
#[tokio::test]
async fn fresh_session_survives_a_tick() {
    let harness = Harness::new();
    let user = UserId::new("carol");
    let now = harness.clock.unix_time_secs();

    harness.orchestrator.mark_running("session-carol", "10.0.0.2");
    harness.store.seed(&user, SessionRecord::ready("10.0.0.2", now - 10));

    let summary = sessiond_reaper::tick::run_tick(
        &harness.store,
        &harness.orchestrator,
        &harness.clock,
        &harness.reaper_config(),
    )
    .await;

    assert_eq!(summary.reaped, 0);
    assert!(harness.orchestrator.exists("session-carol"));
    assert!(harness.store.get_session(&user).await.unwrap().is_some());
}

/// A record stuck `initiating` with no `last_active` is never evicted on
/// the strength of idleness alone (SPEC_FULL §4.E: "to avoid racing the
/// long-poll creation path") — only the orphan-sweep path (§4.E REDESIGN)
/// reaps it, once it is older than `2 × LONG_POLL_BOUND`.
#[tokio::test]
async fn stuck_initiating_record_survives_until_orphan_threshold() {
    let harness = Harness::new();
    let user = UserId::new("dave");
    let now = harness.clock.unix_time_secs();

    harness.store.seed(&user, SessionRecord::initiating(now - 10));
    let summary = sessiond_reaper::tick::run_tick(
        &harness.store,
        &harness.orchestrator,
        &harness.clock,
        &harness.reaper_config(),
    )
    .await;
    assert_eq!(summary.reaped, 0);
    assert!(harness.store.get_session(&user).await.unwrap().is_some());

    // Past 2 * long_poll_bound (90s default -> 180s threshold).
    harness.clock.advance(std::time::Duration::from_secs(200));
    let summary = sessiond_reaper::tick::run_tick(
        &harness.store,
        &harness.orchestrator,
        &harness.clock,
        &harness.reaper_config(),
    )
    .await;
    assert_eq!(summary.reaped, 1);
    assert!(harness.store.get_session(&user).await.unwrap().is_none());
}

/// Multiple reaper replicas double-reaping the same session is safe: a
/// second tick against an already-removed record is a no-op (`Gone`,
/// counted as skipped rather than an error).
#[tokio::test]
async fn second_tick_after_reap_is_a_harmless_noop() {
    let harness = Harness::new();
    let user = UserId::new("gwen");
    let now = harness.clock.unix_time_secs();

    harness.orchestrator.mark_running("session-gwen", "10.0.0.4");
    harness.store.seed(&user, SessionRecord::ready("10.0.0.4", now - 700));

    let first = sessiond_reaper::tick::run_tick(
        &harness.store,
        &harness.orchestrator,
        &harness.clock,
        &harness.reaper_config(),
    )
    .await;
    assert_eq!(first.reaped, 1);

    let second = sessiond_reaper::tick::run_tick(
        &harness.store,
        &harness.orchestrator,
        &harness.clock,
        &harness.reaper_config(),
    )
    .await;
    assert_eq!(second, sessiond_reaper::tick::TickSummary { scanned: 0, reaped: 0, skipped: 0 });
}
