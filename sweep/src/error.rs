//! Fatal sweep errors.
//!
//! Trial failures are not errors: they are recorded as
//! [`TrialStatus::Failed`](crate::core::outcome::TrialStatus) and the sweep
//! continues.

use std::io;
use std::path::PathBuf;

use crate::exit_codes;

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// Bad, missing or malformed arguments or configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// An output directory could not be created.
    #[error("storage error: create {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SweepError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => exit_codes::INVALID,
            Self::Storage { .. } => exit_codes::STORAGE,
        }
    }
}
