// SPDX-License-Identifier: MIT

//! Shared, process-lived handles (SPEC_FULL §9 REDESIGN: "global connection
//! singletons" become a struct passed to handlers instead of process-wide
//! statics).

use crate::config::Config;
use sessiond_adapters::{QueueAdapter, StateStoreAdapter};
use sessiond_core::Clock;
use std::sync::Arc;

/// Generic over the clock implementation, matching the teacher crate's
/// pattern of threading a `Clock` type parameter through the runtime
/// rather than boxing it (`Clock` is not dyn-compatible: it requires
/// `Clone`). Production binaries use `AppState<SystemClock>`; tests use
/// `AppState<FakeClock>`.
#[derive(Clone)]
pub struct AppState<C: Clock> {
    pub store: Arc<dyn StateStoreAdapter>,
    pub queue: Arc<dyn QueueAdapter>,
    pub http_client: reqwest::Client,
    pub clock: C,
    pub config: Arc<Config>,
}
