//! Shared test harness for the cross-component scenarios in SPEC_FULL §8.
//!
//! Each scenario wires the real [`sessiond_gateway::dispatch`] /
//! [`sessiond_worker::reconcile`] / [`sessiond_reaper::tick`] logic against
//! the in-memory fake adapters from `sessiond_adapters`, plus a tiny real
//! HTTP server standing in for a sandbox container.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::any;
use axum::Router;
use sessiond_adapters::{FakeOrchestratorAdapter, FakeQueueAdapter, FakeStateStoreAdapter};
use sessiond_core::FakeClock;
use sessiond_gateway::config::Config as GatewayConfig;
use sessiond_gateway::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A tiny upstream HTTP server standing in for a sandbox container
/// (SPEC_FULL §4.F "Proxy semantics"): echoes the request path and method
/// back as the response body with a marker header, so tests can assert the
/// gateway actually streamed the request through and relayed the response
/// verbatim.
pub struct EchoServer {
    pub addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl EchoServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(any(echo_handler));
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, _handle: handle }
    }
}

async fn echo_handler(req: Request) -> axum::response::Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let mut response = axum::response::Response::new(Body::from(format!("{method} {path}")));
    response
        .headers_mut()
        .insert("x-echo", HeaderValue::from_static("true"));
    response
}

/// Binds a listener and immediately drops it, freeing the port while
/// guaranteeing nothing is listening on it (SPEC_FULL scenario 7: "a port
/// that refuses connections").
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub struct Harness {
    pub store: FakeStateStoreAdapter,
    pub queue: FakeQueueAdapter,
    pub orchestrator: FakeOrchestratorAdapter,
    pub clock: FakeClock,
    pub gateway_config: Arc<GatewayConfig>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: FakeStateStoreAdapter::new(),
            queue: FakeQueueAdapter::new(),
            orchestrator: FakeOrchestratorAdapter::new(),
            clock: FakeClock::new(),
            gateway_config: Arc::new(Harness::default_gateway_config()),
        }
    }

    fn default_gateway_config() -> GatewayConfig {
        GatewayConfig {
            redis_host: String::new(),
            redis_password: String::new(),
            rabbitmq_host: String::new(),
            rabbitmq_user: String::new(),
            rabbitmq_password: String::new(),
            sandbox_port: 0, // overwritten per-test once the echo server's port is known
            long_poll: Duration::from_millis(500),
            proxy_timeout: Duration::from_secs(5),
            bind_addr: "127.0.0.1:0".to_string(),
        }
    }

    pub fn with_sandbox_port(mut self, port: u16) -> Self {
        Arc::make_mut(&mut self.gateway_config).sandbox_port = port;
        self
    }

    pub fn with_long_poll(mut self, bound: Duration) -> Self {
        Arc::make_mut(&mut self.gateway_config).long_poll = bound;
        self
    }

    pub fn gateway_state(&self) -> AppState<FakeClock> {
        AppState {
            store: Arc::new(self.store.clone()),
            queue: Arc::new(self.queue.clone()),
            http_client: reqwest::Client::new(),
            clock: self.clock.clone(),
            config: self.gateway_config.clone(),
        }
    }

    pub fn worker_config(&self) -> sessiond_worker::config::Config {
        sessiond_worker::config::Config {
            redis_host: String::new(),
            redis_password: String::new(),
            rabbitmq_host: String::new(),
            rabbitmq_user: String::new(),
            rabbitmq_password: String::new(),
            namespace: "default".to_string(),
            sandbox_image: "httpd:2.4-alpine".to_string(),
            sandbox_port: 80,
            watch_timeout: Duration::from_secs(5),
        }
    }

    pub fn reaper_config(&self) -> sessiond_reaper::config::Config {
        sessiond_reaper::config::Config {
            redis_host: String::new(),
            redis_password: String::new(),
            namespace: "default".to_string(),
            idle_timeout: Duration::from_secs(600),
            reaper_period: Duration::from_secs(60),
            long_poll_bound: Duration::from_secs(90),
        }
    }
}

/// Drains every message currently queued, reconciling each one against the
/// harness's fake orchestrator — a single-iteration stand-in for the
/// Worker's consume loop (SPEC_FULL §4.D), driven synchronously so tests
/// don't need to race a background task.
pub async fn drain_worker_queue(harness: &Harness) {
    loop {
        if harness.queue.is_empty() {
            break;
        }
        let delivery = harness.queue.recv().await.unwrap();
        let user_id = delivery.message.user_id();
        let _ = sessiond_worker::reconcile::reconcile(
            &harness.store,
            &harness.orchestrator,
            &harness.clock,
            &user_id,
            &harness.worker_config(),
        )
        .await;
        delivery.ack().await.unwrap();
    }
}

pub fn get(path: &str, user_id: &str) -> Request {
    Request::builder()
        .method("GET")
        .uri(path)
        .header("X-User-ID", user_id)
        .body(Body::empty())
        .unwrap()
}

pub fn get_without_user_id(path: &str) -> Request {
    Request::builder().method("GET").uri(path).body(Body::empty()).unwrap()
}

pub async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn assert_status(response: &axum::response::Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status code");
}
