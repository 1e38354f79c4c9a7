//! autocommit application library
//!
//! Wires the core run logic to git2, the TOML configuration and the
//! schedule. Exposed for the binary and the integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod git;
pub mod schedule;
