//! Parameter sweep driver for the Net2Plan network-design tool.
//!
//! The driver runs the external planner repeatedly over an increasing
//! sequence of demand counts and stores every successful trial's XML result
//! under a fixed directory layout that the `report` crate later aggregates.
//!
//! - **[`core`]**: Pure, deterministic logic (argument validation, layout
//!   paths, outcome classification, stop rule). No I/O.
//! - **[`io`]**: Side-effecting operations (directories, child processes,
//!   tool configuration files).
//!
//! [`driver`] coordinates both to implement the `sweep` command.

pub mod core;
pub mod driver;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::SweepError;
