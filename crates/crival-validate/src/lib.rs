//! Container lifecycle conformance checks for CRI runtimes.
//!
//! The runtime is reached only through the [`client`] traits. A
//! [`Harness`](framework::Harness) bundles the clients with a
//! [`ValidateConfig`](crival_common::config::ValidateConfig) and exposes
//! the lifecycle assertions; [`scenarios`] builds the conformance checks
//! on top of them.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod client;
pub mod framework;
pub mod hostpath;
pub mod lifecycle;
pub mod scenarios;

pub use framework::{Harness, SandboxFixture};
pub use scenarios::{SCENARIOS, Scenario};
