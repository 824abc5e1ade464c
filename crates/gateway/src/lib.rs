// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sessiond-gateway: HTTP ingress, session state machine, long-poll,
//! streaming reverse proxy (SPEC_FULL §4.F).
//!
//! Split into a library (this crate) and a thin binary (`main.rs`) so the
//! state machine and proxy logic can be driven directly by integration
//! tests with fake adapters, without standing up a real HTTP listener.

pub mod config;
pub mod dispatch;
pub mod proxy;
pub mod state;
