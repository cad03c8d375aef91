//! Side-effecting operations: directories, child processes, config files.

pub mod config;
pub mod process;
pub mod storage;
pub mod tool;
