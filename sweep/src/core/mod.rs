//! Pure sweep logic.
//!
//! Nothing in here touches the filesystem or spawns processes; the result
//! layout, outcome classification and stop rule are deterministic functions
//! of their inputs.

pub mod layout;
pub mod outcome;
pub mod sweep_config;
