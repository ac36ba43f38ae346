//! # crival-common
//!
//! Shared error definitions, CRI domain types, configuration, and constants
//! used across the crival workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and only models the wire-level shapes of the external
//! runtime; it never talks to one.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
