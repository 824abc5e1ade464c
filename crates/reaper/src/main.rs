// SPDX-License-Identifier: MIT

//! Reaper binary: periodic idle-timeout eviction (SPEC_FULL §4.E).

use sessiond_adapters::{KubeOrchestratorAdapter, RedisStateStore};
use sessiond_core::SystemClock;
use sessiond_reaper::config::Config;
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
    info!(
        namespace = %config.namespace,
        idle_timeout_secs = config.idle_timeout.as_secs(),
        period_secs = config.reaper_period.as_secs(),
        "reaper starting"
    );

    let store = RedisStateStore::connect(&config.redis_host, &config.redis_password).await;
    let orchestrator = connect_orchestrator(&config.namespace).await;
    let clock = SystemClock;

    info!("reaper ready, ticking every {}s", config.reaper_period.as_secs());
    sessiond_reaper::run(&store, &orchestrator, &clock, &config, shutdown_signal()).await;
    info!("reaper shut down");
}

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
