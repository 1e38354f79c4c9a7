//! autocommit core - run logic with no git or filesystem dependencies
//!
//! This crate holds the domain types, the ports (interfaces) a run talks to,
//! and the orchestration that drives one run from checkout to push. Git and
//! clock access are provided by adapters in the application crate.

pub mod app;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for ergonomics
pub use app::*;
pub use domain::*;
pub use error::*;
