//! Output directory creation.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::SweepError;

/// Create `dir` and its parents if missing. Failure is fatal for the sweep.
pub fn ensure_dir(dir: &Path) -> Result<(), SweepError> {
    if dir.is_dir() {
        return Ok(());
    }
    debug!(dir = %dir.display(), "creating directory");
    fs::create_dir_all(dir).map_err(|source| SweepError::Storage {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_nested_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("a/b/c");
        ensure_dir(&dir).expect("create");
        assert!(dir.is_dir());
        ensure_dir(&dir).expect("idempotent");
    }

    #[test]
    fn file_in_the_way_is_storage_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").expect("write");
        let err = ensure_dir(&blocker.join("child")).expect_err("blocked");
        assert!(matches!(err, SweepError::Storage { .. }));
    }
}
