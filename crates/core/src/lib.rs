// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sessiond-core: shared domain types for the session-pod orchestration plane.
//!
//! This crate has no I/O of its own — it defines the session state machine,
//! the sandbox-name sanitization rule shared by the worker and reaper, and
//! the queue message schema. Every other crate in the workspace depends on
//! it and builds adapters or binaries around these types.

pub mod clock;
pub mod queue;
pub mod sanitize;
pub mod session;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
pub use queue::ProvisionMessage;
pub use sanitize::sanitize_user_id;
pub use session::{SessionRecord, SessionStatus, UserId};
