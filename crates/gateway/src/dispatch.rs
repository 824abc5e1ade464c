// SPDX-License-Identifier: MIT

//! Per-request session state machine (SPEC_FULL §4.F).
//!
//! The reference gateway re-enters its own request handler on the
//! `absent → initiating` and `failed → absent` transitions. This
//! implementation expresses the same behavior as a bounded loop over the
//! dispatch table (§9 REDESIGN: "Recursive handler → loop") — at most one
//! state transition happens per incoming request, so two iterations is
//! always enough.

use crate::proxy::{proxy_request, ProxyOutcome};
use crate::state::AppState;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sessiond_adapters::StoreError;
use sessiond_core::queue::ProvisionMessage;
use sessiond_core::session::{SessionStatus, UserId};
use sessiond_core::Clock;
use tracing::{debug, info, warn};

const MAX_DISPATCH_ITERATIONS: usize = 2;

/// Top-level request entry point (SPEC_FULL §4.F step 1-2): extracts the
/// user identity from `X-User-ID`, then runs the dispatch loop. Shared by
/// the binary's axum handler and by integration tests that want to drive
/// the gateway end-to-end without going over HTTP.
pub async fn handle_request<C: Clock>(state: &AppState<C>, req: Request) -> Response {
    let user_id = req
        .headers()
        .get("X-User-ID")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(UserId::new);

    let Some(user_id) = user_id else {
        return (StatusCode::BAD_REQUEST, "X-User-ID header is required.").into_response();
    };

    dispatch(state, user_id, req).await
}

pub async fn dispatch<C: Clock>(state: &AppState<C>, user_id: UserId, req: Request) -> Response {
    let mut req = Some(req);

    for _ in 0..MAX_DISPATCH_ITERATIONS {
        let record = match state.store.get_session(&user_id).await {
            Ok(record) => record,
            Err(StoreError::Unavailable(e)) => {
                warn!(%user_id, error = %e, "state store unavailable");
                return (StatusCode::SERVICE_UNAVAILABLE, "Gateway service is down.").into_response();
            }
            Err(StoreError::Other(e)) => {
                warn!(%user_id, error = %e, "state store error");
                return internal_error(&e);
            }
        };

        match record {
            None => {
                info!(%user_id, "new session, triggering creation");
                let now = state.clock.unix_time_secs();
                if let Err(e) = state.store.put_initiating(&user_id, now).await {
                    warn!(%user_id, error = %e, "failed to write initiating record");
                    return internal_error(e);
                }
                let message = ProvisionMessage::for_user(&user_id);
                if let Err(e) = state.queue.publish(&message).await {
                    warn!(%user_id, error = %e, "failed to publish provisioning request");
                    let _ = state.store.delete_session(&user_id).await;
                    return internal_error(e);
                }
                // Re-observe state (equivalent to the source's self-recursion).
                continue;
            }

            Some(record) if record.status == SessionStatus::Ready => {
                let Some(addr) = record.addr.filter(|a| !a.is_empty()) else {
                    warn!(%user_id, "ready record missing addr");
                    return internal_error("session 'ready' but no address");
                };
                let Some(req) = req.take() else {
                    return internal_error("request consumed twice");
                };
                let outcome = proxy_request(
                    &state.http_client,
                    &addr,
                    state.config.sandbox_port,
                    req,
                    state.config.proxy_timeout,
                )
                .await;
                // I3 / SPEC scenario 7: `last_active` only advances on a
                // successful proxy (the sandbox was reached at all), not on
                // any particular upstream status code, and never on an
                // unreachable sandbox.
                if matches!(outcome, ProxyOutcome::Reached(_)) {
                    let now = state.clock.unix_time_secs();
                    let _ = state.store.touch(&user_id, now).await;
                }
                return outcome.into_response();
            }

            Some(record) if record.status == SessionStatus::Initiating => {
                return long_poll(state, &user_id, req.take()).await;
            }

            Some(_failed) => {
                warn!(%user_id, "retrying failed session");
                let _ = state.store.delete_session(&user_id).await;
                continue;
            }
        }
    }

    internal_error("dispatch loop exceeded bound")
}

async fn long_poll<C: Clock>(
    state: &AppState<C>,
    user_id: &UserId,
    mut req: Option<Request>,
) -> Response {
    info!(%user_id, "session initiating, entering long poll");
    let deadline = state.clock.now() + state.config.long_poll;

    while state.clock.now() < deadline {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;

        let record = match state.store.get_session(user_id).await {
            Ok(record) => record,
            Err(StoreError::Unavailable(e)) => {
                warn!(%user_id, error = %e, "state store unavailable during long poll");
                return (StatusCode::SERVICE_UNAVAILABLE, "Gateway service is down.").into_response();
            }
            Err(StoreError::Other(e)) => return internal_error(&e),
        };

        match record {
            Some(record) if record.status == SessionStatus::Ready => {
                let Some(addr) = record.addr.filter(|a| !a.is_empty()) else {
                    return internal_error("session 'ready' but no address");
                };
                debug!(%user_id, %addr, "long poll observed ready");
                let Some(req) = req.take() else {
                    return internal_error("request consumed twice");
                };
                let outcome = proxy_request(
                    &state.http_client,
                    &addr,
                    state.config.sandbox_port,
                    req,
                    state.config.proxy_timeout,
                )
                .await;
                if matches!(outcome, ProxyOutcome::Reached(_)) {
                    let now = state.clock.unix_time_secs();
                    let _ = state.store.touch(user_id, now).await;
                }
                return outcome.into_response();
            }
            Some(record) if record.status == SessionStatus::Failed => {
                return internal_error("pod creation failed, please try again");
            }
            _ => continue,
        }
    }

    (StatusCode::GATEWAY_TIMEOUT, "Gateway timeout: pod creation is taking too long.").into_response()
}

fn internal_error(detail: impl std::fmt::Display) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, format!("An internal server error occurred: {detail}"))
        .into_response()
}
