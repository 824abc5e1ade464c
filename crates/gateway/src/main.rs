// SPDX-License-Identifier: MIT

//! Gateway binary: HTTP ingress, session state machine, streaming reverse
//! proxy (SPEC_FULL §4.F).

use axum::extract::{Request, State};
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use sessiond_adapters::{AmqpQueueAdapter, RedisStateStore};
use sessiond_core::SystemClock;
use sessiond_gateway::config::Config;
use sessiond_gateway::dispatch::handle_request;
use sessiond_gateway::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
#[allow(clippy::expect_used, clippy::panic)]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load();
    info!(bind_addr = %config.bind_addr, "gateway starting");

    let store = RedisStateStore::connect(&config.redis_host, &config.redis_password).await;
    let queue =
        AmqpQueueAdapter::connect(&config.rabbitmq_host, &config.rabbitmq_user, &config.rabbitmq_password)
            .await;
    let http_client = reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .expect("reqwest client configuration is valid");

    let state = AppState {
        store: Arc::new(store),
        queue: Arc::new(queue),
        http_client,
        clock: SystemClock,
        config: Arc::new(config.clone()),
    };

    let app = Router::new()
        .fallback(any(handle_all_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {e}", config.bind_addr));

    info!(bind_addr = %config.bind_addr, "gateway listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.unwrap_or_else(|e| {
        warn!(error = %e, "gateway server exited with error");
    });
}

async fn handle_all_requests(State(state): State<AppState<SystemClock>>, req: Request) -> Response {
    handle_request(&state, req).await
}

#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining in-flight requests");
}
