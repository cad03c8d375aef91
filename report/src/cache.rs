//! Serialized unified table.
//!
//! When the cache file exists it is trusted verbatim: the result tree is not
//! read at all. Delete the file (or pass `--rebuild`) to force a rescan.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sweep::core::layout::LayoutPath;
use tracing::{debug, info, instrument};

use crate::store::RecordStore;
use crate::table::UnifiedTable;

#[derive(Debug, Serialize, Deserialize)]
pub struct CachedTable {
    pub built_at: DateTime<Utc>,
    pub table: UnifiedTable,
}

/// Where the table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    Cache,
    Tree,
}

#[derive(Debug)]
pub struct LoadedTable {
    pub table: UnifiedTable,
    pub source: TableSource,
    pub warnings: Vec<String>,
}

pub fn cache_path(output_root: &Path, cache_file: &str) -> PathBuf {
    output_root.join(cache_file)
}

pub fn load_cache(path: &Path) -> Result<Option<CachedTable>> {
    if !path.exists() {
        return Ok(None);
    }
    debug!(path = %path.display(), "loading cached table");
    let contents = fs::read_to_string(path).with_context(|| format!("read cache {}", path.display()))?;
    let cached: CachedTable = serde_json::from_str(&contents)
        .with_context(|| format!("parse cache {}", path.display()))?;
    Ok(Some(cached))
}

/// Atomically write the cache (temp file + rename).
pub fn save_cache(path: &Path, table: &UnifiedTable) -> Result<()> {
    let cached = CachedTable {
        built_at: Utc::now(),
        table: table.clone(),
    };
    let contents = serde_json::to_string(&cached).context("serialize cache")?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp cache {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace cache {}", path.display()))?;
    Ok(())
}

/// Load the unified table from the cache, or scan the tree and cache it.
#[instrument(skip_all, fields(cache = %cache.display()))]
pub fn load_table(layout: &LayoutPath, cache: &Path) -> Result<LoadedTable> {
    if let Some(cached) = load_cache(cache)? {
        info!(rows = cached.table.len(), built_at = %cached.built_at, "using cached table");
        return Ok(LoadedTable {
            table: cached.table,
            source: TableSource::Cache,
            warnings: Vec::new(),
        });
    }

    let store = RecordStore::scan(layout)?;
    debug!(artifacts = store.len(), "result tree scanned");
    let warnings = store.warnings.clone();
    let table = store.into_table();
    save_cache(cache, &table)?;
    info!(rows = table.len(), "table rebuilt from result tree");
    Ok(LoadedTable {
        table,
        source: TableSource::Tree,
        warnings,
    })
}
