// SPDX-License-Identifier: MIT

//! Lifecycle Worker binary (SPEC_FULL §4.D).

use sessiond_adapters::{AmqpQueueAdapter, KubeOrchestratorAdapter, RedisStateStore};
use sessiond_core::SystemClock;
use sessiond_worker::config::Config;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load();
    info!(namespace = %config.namespace, "worker starting");

    let store = RedisStateStore::connect(&config.redis_host, &config.redis_password).await;
    let queue =
        AmqpQueueAdapter::connect(&config.rabbitmq_host, &config.rabbitmq_user, &config.rabbitmq_password)
            .await;
    let orchestrator = connect_orchestrator(&config.namespace).await;
    let clock = SystemClock;

    info!("worker ready, consuming provisioning queue");
    sessiond_worker::run(&store, &queue, &orchestrator, &clock, &config, shutdown_signal()).await;
    info!("worker shut down");
}

/// Connects to the orchestrator, retrying with a fixed 5s backoff until it
/// succeeds (SPEC_FULL §7: same startup recovery policy as the state store
/// and message broker).
async fn connect_orchestrator(namespace: &str) -> KubeOrchestratorAdapter {
    loop {
        match KubeOrchestratorAdapter::connect(namespace).await {
            Ok(adapter) => {
                info!(%namespace, "connected to orchestrator");
                return adapter;
            }
            Err(e) => {
                warn!(%namespace, error = %e, "orchestrator not ready, retrying in 5s");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
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
}
