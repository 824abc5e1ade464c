//! Gateway scenarios (SPEC_FULL §8), each driven through
//! [`sessiond_gateway::dispatch::handle_request`] against fake adapters
//! plus a real upstream HTTP server, exercising the Gateway, Worker, and
//! state store together rather than any one component in isolation.

use crate::support::{assert_status, body_text, drain_worker_queue, get, get_without_user_id, EchoServer, Harness};
use axum::http::StatusCode;
use sessiond_core::session::{SessionStatus, UserId};
use std::time::Duration;

/// Scenario 1 (Cold start): absent record converges to `ready` and the
/// response is the upstream's response.
#[tokio::test]
async fn cold_start_converges_to_ready_and_proxies() {
    let echo = EchoServer::start().await;
    let harness = Harness::new().with_sandbox_port(echo.addr.port()).with_long_poll(Duration::from_secs(3));
    let user = UserId::new("alice");

    // Simulate the sandbox becoming schedulable shortly after creation.
    let orch = harness.orchestrator.clone();
    let echo_ip = echo.addr.ip().to_string();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        orch.mark_running("session-alice", &echo_ip);
    });

    // Drain whatever the Gateway publishes, once, a little after it does.
    let harness_for_worker = Harness {
        store: harness.store.clone(),
        queue: harness.queue.clone(),
        orchestrator: harness.orchestrator.clone(),
        clock: harness.clock.clone(),
        gateway_config: harness.gateway_config.clone(),
    };
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        drain_worker_queue(&harness_for_worker).await;
    });

    let state = harness.gateway_state();
    let response = sessiond_gateway::dispatch::handle_request(&state, get("/x", "alice")).await;

    assert_status(&response, StatusCode::OK);
    let body = body_text(response).await;
    assert_eq!(body, "GET /x");

    let record = harness.store.get_session(&user).await.unwrap().unwrap();
    assert_eq!(record.status, SessionStatus::Ready);
    assert!(record.last_active.is_some());
}

/// Scenario 2 (Warm hit): a `ready` record is proxied immediately, with no
/// new queue message, and `last_active` advances.
#[tokio::test]
async fn warm_hit_skips_provisioning() {
    let echo = EchoServer::start().await;
    let harness = Harness::new().with_sandbox_port(echo.addr.port());
    let user = UserId::new("bob");

    harness.store.put_ready(&user, &echo.addr.ip().to_string(), 1_000).await.unwrap();

    let state = harness.gateway_state();
    let response = sessiond_gateway::dispatch::handle_request(&state, get("/y", "bob")).await;

    assert_status(&response, StatusCode::OK);
    assert_eq!(body_text(response).await, "GET /y");
    assert!(harness.queue.is_empty(), "warm hit must not publish a provisioning message");

    let record = harness.store.get_session(&user).await.unwrap().unwrap();
    assert!(record.last_active.unwrap() > 1_000);
}

/// Scenario 3 (Concurrent cold) / I6: 5 parallel first requests for the
/// same identity converge on exactly one sandbox and all succeed.
#[tokio::test]
async fn concurrent_cold_requests_converge_on_one_sandbox() {
    let echo = EchoServer::start().await;
    let harness = Harness::new().with_sandbox_port(echo.addr.port()).with_long_poll(Duration::from_secs(5));
    let name = "session-carol";

    let orch = harness.orchestrator.clone();
    let echo_ip = echo.addr.ip().to_string();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(80)).await;
        orch.mark_running(name, &echo_ip);
    });

    let harness_for_worker = Harness {
        store: harness.store.clone(),
        queue: harness.queue.clone(),
        orchestrator: harness.orchestrator.clone(),
        clock: harness.clock.clone(),
        gateway_config: harness.gateway_config.clone(),
    };
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drain_worker_queue(&harness_for_worker).await;
        }
    });

    let state = harness.gateway_state();
    let responses = futures_util::future::join_all((0..5).map(|i| {
        let state = state.clone();
        async move {
            sessiond_gateway::dispatch::handle_request(&state, get(&format!("/r{i}"), "carol")).await
        }
    }))
    .await;

    for response in responses {
        assert_status(&response, StatusCode::OK);
    }
    // I6: the orchestrator's name-uniqueness means at most one pod exists
    // under the sanitized name regardless of how many messages were
    // published for the race.
    assert!(harness.orchestrator.exists(name));
}

/// Scenario 4 (Provision timeout): a watch timeout marks the session
/// `failed`, and a request long-polling on the `initiating` record sees
/// `500` as soon as that lands, well inside the 90s bound.
#[tokio::test]
async fn provision_timeout_surfaces_as_internal_error() {
    let harness = Harness::new().with_long_poll(Duration::from_secs(5));
    let user = UserId::new("dave");
    harness.orchestrator.mark_never_ready("session-dave");
    harness.store.put_initiating(&user, harness.clock.unix_time_secs()).await.unwrap();

    // Simulate the Worker reconciling the provisioning message concurrently
    // with the Gateway's long poll, as it would when pulled off the queue.
    let store = harness.store.clone();
    let orchestrator = harness.orchestrator.clone();
    let clock = harness.clock.clone();
    let mut worker_config = harness.worker_config();
    worker_config.watch_timeout = Duration::from_millis(20);
    tokio::spawn(async move {
        let _ = sessiond_worker::reconcile::reconcile(&store, &orchestrator, &clock, &user, &worker_config).await;
    });

    let state = harness.gateway_state();
    let user = UserId::new("dave");
    let response = sessiond_gateway::dispatch::handle_request(&state, get("/", "dave")).await;
    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);

    let record = harness.store.get_session(&user).await.unwrap().unwrap();
    assert_eq!(record.status, SessionStatus::Failed);
}

/// Scenario 6 (Missing header): `400`, no store writes, no queue writes.
#[tokio::test]
async fn missing_header_is_rejected_without_side_effects() {
    let harness = Harness::new();
    let state = harness.gateway_state();

    let response = sessiond_gateway::dispatch::handle_request(&state, get_without_user_id("/")).await;
    assert_status(&response, StatusCode::BAD_REQUEST);

    assert!(harness.store.scan_sessions().await.unwrap().is_empty());
    assert!(harness.queue.is_empty());
}

/// Scenario 7 (Upstream 503): a `ready` record pointing at a refusing port
/// produces `503`, and the record is left untouched.
#[tokio::test]
async fn upstream_refusal_returns_503_without_touching_record() {
    let unreachable = crate::support::unreachable_addr().await;
    let harness = Harness::new().with_sandbox_port(unreachable.port());
    let user = UserId::new("erin");
    harness.store.put_ready(&user, &unreachable.ip().to_string(), 500).await.unwrap();

    let state = harness.gateway_state();
    let response = sessiond_gateway::dispatch::handle_request(&state, get("/", "erin")).await;
    assert_status(&response, StatusCode::SERVICE_UNAVAILABLE);

    let record = harness.store.get_session(&user).await.unwrap().unwrap();
    assert_eq!(record.status, SessionStatus::Ready);
    assert_eq!(record.last_active, Some(500));
}
