//! Record store built by walking the result tree.
//!
//! Walks `policy -> C<skew> -> demands<N>` exhaustively. Each leaf directory's
//! key is parsed once by [`LayoutPath`] and attached to every record read from
//! it, so nothing downstream looks at paths again.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sweep::core::layout::{ArtifactKey, LayoutPath};
use tracing::{debug, instrument, warn};

use crate::artifact::{is_artifact, read_artifact};
use crate::table::{Fields, Row, UnifiedTable};

/// One parsed artifact file.
#[derive(Debug, Clone)]
pub struct ArtifactRecord {
    pub key: ArtifactKey,
    pub path: PathBuf,
    pub rows: Vec<Fields>,
}

#[derive(Debug, Default)]
pub struct RecordStore {
    pub records: Vec<ArtifactRecord>,
    /// Directories and files that could not be used.
    pub warnings: Vec<String>,
}

impl RecordStore {
    /// Enumerate every artifact below `layout`, printing the file tree.
    #[instrument(skip_all, fields(root = %layout.root().display()))]
    pub fn scan(layout: &LayoutPath) -> Result<Self> {
        let mut store = RecordStore::default();
        println!("File tree");
        for policy_dir in list_entries(layout.root(), EntryKind::Dir)? {
            println!("\t{}", file_name(&policy_dir));
            for skew_dir in list_entries(&policy_dir, EntryKind::Dir)? {
                println!("\t\t{}", file_name(&skew_dir));
                for demands_dir in list_entries(&skew_dir, EntryKind::Dir)? {
                    println!("\t\t\t{}", file_name(&demands_dir));
                    store.scan_leaf(layout, &demands_dir)?;
                }
            }
        }
        debug!(records = store.records.len(), "scan finished");
        Ok(store)
    }

    fn scan_leaf(&mut self, layout: &LayoutPath, dir: &Path) -> Result<()> {
        let Some(key) = layout.key_for(dir) else {
            let warning = format!("skip {}: not a result directory", dir.display());
            warn!("{warning}");
            self.warnings.push(warning);
            return Ok(());
        };
        for file in list_entries(dir, EntryKind::File)? {
            println!("\t\t\t\t{}", file_name(&file));
            if !is_artifact(&file) {
                continue;
            }
            match read_artifact(&file) {
                Ok(rows) => self.records.push(ArtifactRecord {
                    key,
                    path: file,
                    rows,
                }),
                Err(err) => {
                    let warning = format!("skip {err}");
                    warn!("{warning}");
                    self.warnings.push(warning);
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn into_table(self) -> UnifiedTable {
        let mut table = UnifiedTable::default();
        for record in self.records {
            debug!(path = %record.path.display(), rows = record.rows.len(), "artifact loaded");
            for fields in record.rows {
                table.push(Row::new(record.key, fields));
            }
        }
        table
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
}

fn list_entries(dir: &Path, kind: EntryKind) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.context("read entry")?;
        let path = entry.path();
        let matches = match kind {
            EntryKind::Dir => path.is_dir(),
            EntryKind::File => path.is_file(),
        };
        if matches {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep::core::layout::TransponderPolicy;
    use sweep::test_support::{populate, write_artifact};
    use tempfile::tempdir;

    fn key(policy: TransponderPolicy, skew: f64, demands: u64) -> ArtifactKey {
        ArtifactKey {
            policy,
            skew,
            demands,
        }
    }

    #[test]
    fn every_artifact_becomes_exactly_one_row() {
        let temp = tempdir().expect("tempdir");
        let layout = LayoutPath::new(temp.path());
        populate(&layout, &key(TransponderPolicy::Single, 50.0, 100), 3);
        populate(&layout, &key(TransponderPolicy::Single, 50.0, 150), 2);
        populate(&layout, &key(TransponderPolicy::Multiple, 50.0, 100), 3);
        populate(&layout, &key(TransponderPolicy::Multiple, 25.0, 100), 1);

        let store = RecordStore::scan(&layout).expect("scan");
        assert_eq!(store.len(), 9);
        assert!(store.warnings.is_empty());
        let table = store.into_table();
        assert_eq!(table.len(), 9);
    }

    #[test]
    fn records_carry_keys_from_their_directory() {
        let temp = tempdir().expect("tempdir");
        let layout = LayoutPath::new(temp.path());
        let original = key(TransponderPolicy::Multiple, 12.5, 40);
        write_artifact(
            &layout.demands_dir(&original),
            "r.xml",
            &[("total_Cost".to_string(), "9".to_string())],
        );

        let store = RecordStore::scan(&layout).expect("scan");
        assert_eq!(store.records[0].key, original);
        let table = store.into_table();
        assert_eq!(table.rows[0].demands(), 40);
        assert_eq!(table.rows[0].policy(), TransponderPolicy::Multiple);
    }

    #[test]
    fn ignores_non_artifacts_and_reports_unparsable_ones() {
        let temp = tempdir().expect("tempdir");
        let layout = LayoutPath::new(temp.path());
        let leaf = layout.demands_dir(&key(TransponderPolicy::Single, 50.0, 10));
        populate(&layout, &key(TransponderPolicy::Single, 50.0, 10), 1);
        fs::write(leaf.join("output.n2p"), "binary-ish").expect("n2p");
        fs::write(leaf.join("broken.xml"), "<data><row>").expect("broken");
        fs::write(temp.path().join("unified_table.json"), "{}").expect("cache file");

        let store = RecordStore::scan(&layout).expect("scan");
        assert_eq!(store.len(), 1);
        assert_eq!(store.warnings.len(), 1);
        assert!(store.warnings[0].contains("broken.xml"));
    }

    #[test]
    fn unknown_directories_are_skipped_with_warning() {
        let temp = tempdir().expect("tempdir");
        let layout = LayoutPath::new(temp.path());
        let stray = temp.path().join("plots/C1.0/demands5");
        fs::create_dir_all(&stray).expect("stray");

        let store = RecordStore::scan(&layout).expect("scan");
        assert_eq!(store.len(), 0);
        assert_eq!(store.warnings.len(), 1);
    }
}
