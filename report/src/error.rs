use std::io;
use std::path::PathBuf;

/// Errors raised while loading artifacts or computing a single report.
///
/// A `SchemaMismatch` only ever skips the report that raised it.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    /// Every partition was empty, so there is nothing to draw.
    #[error("no data: {0}")]
    NoData(String),
    #[error("parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("io {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ReportError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaMismatch(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
