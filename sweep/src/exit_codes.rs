//! Stable exit codes for the `sweep` and `report` binaries.

/// Command finished.
pub const OK: i32 = 0;
/// Invalid arguments or configuration.
pub const INVALID: i32 = 1;
/// An output directory could not be created.
pub const STORAGE: i32 = 2;
