//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`plan`] - Grid layout of the configured cache
//! - [`status`] - Per-level tile status counts
//! - [`build`] - Fetch and reduce the whole pyramid
//! - [`tile`] - Single tile lookup

pub mod build;
pub mod common;
pub mod plan;
pub mod status;
pub mod tile;
