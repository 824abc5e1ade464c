// SPDX-License-Identifier: MIT

//! Streaming reverse proxy into a sandbox (SPEC_FULL §4.F "Proxy
//! semantics"): request and response bodies are forwarded chunk-by-chunk,
//! never buffered in full.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::time::Duration;
use tracing::warn;

/// Result of one proxy attempt, distinguishing a genuine upstream response
/// (whatever its status code) from a connection-level failure to reach the
/// sandbox at all (SPEC_FULL §4.F: "Upstream connection refusal or
/// transport error ⇒ `503` ... the session record is not modified").
///
/// The distinction matters to the caller: I3 ties `last_active` to a
/// *successful proxy*, i.e. [`ProxyOutcome::Reached`], not to any
/// particular upstream status code.
pub enum ProxyOutcome {
    Reached(Response),
    Unreachable(Response),
}

impl ProxyOutcome {
    pub fn into_response(self) -> Response {
        match self {
            ProxyOutcome::Reached(r) | ProxyOutcome::Unreachable(r) => r,
        }
    }
}

pub async fn proxy_request(
    client: &reqwest::Client,
    addr: &str,
    port: u16,
    req: Request,
    timeout: Duration,
) -> ProxyOutcome {
    let (parts, body) = req.into_parts();
    let path_and_query = parts.uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let target_url = format!("http://{addr}:{port}{path_and_query}");

    let mut headers = parts.headers.clone();
    headers.remove(axum::http::header::HOST);
    if let Ok(host_value) = HeaderValue::from_str(addr) {
        headers.insert(axum::http::header::HOST, host_value);
    }

    let method =
        reqwest::Method::from_bytes(parts.method.as_str().as_bytes()).unwrap_or(reqwest::Method::GET);

    let upstream_req = client
        .request(method, &target_url)
        .headers(headers)
        .timeout(timeout)
        .body(reqwest::Body::wrap_stream(body.into_data_stream()))
        .build();

    let upstream_req = match upstream_req {
        Ok(r) => r,
        Err(e) => {
            warn!(%target_url, error = %e, "failed to build upstream request");
            return ProxyOutcome::Unreachable(unreachable_response());
        }
    };

    let upstream_resp = match client.execute(upstream_req).await {
        Ok(r) => r,
        Err(e) => {
            warn!(%target_url, error = %e, "sandbox not reachable");
            return ProxyOutcome::Unreachable(unreachable_response());
        }
    };

    let status = StatusCode::from_u16(upstream_resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response_headers = axum::http::HeaderMap::new();
    for (name, value) in upstream_resp.headers() {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            response_headers.append(name, value);
        }
    }

    let body = Body::from_stream(upstream_resp.bytes_stream());
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    ProxyOutcome::Reached(response)
}

fn unreachable_response() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "Session pod not reachable.").into_response()
}
