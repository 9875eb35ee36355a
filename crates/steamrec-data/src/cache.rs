//! Caller-owned cache of loaded rating tables
//!
//! Keyed by path. An entry is reused while the file's modification time is
//! unchanged, and can be dropped explicitly with [`TableCache::invalidate`]
//! or [`TableCache::clear`]. The cache lives as long as its owner; there is
//! no process-wide instance.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use steamrec_core::RatingTable;
use tracing::debug;

use crate::error::Result;
use crate::json::load_json_table;

struct CachedTable {
    modified: Option<SystemTime>,
    table: Arc<RatingTable>,
}

/// Thread-safe cache of JSON rating tables
#[derive(Default)]
pub struct TableCache {
    entries: RwLock<HashMap<PathBuf, CachedTable>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it on a miss or when the
    /// file changed since it was cached.
    ///
    /// Files whose modification time cannot be read are reloaded every time.
    pub fn get_or_load(&self, path: impl AsRef<Path>) -> Result<Arc<RatingTable>> {
        let path = path.as_ref();
        let modified = fs::metadata(path)?.modified().ok();

        if let Some(entry) = self.entries.read().get(path) {
            if modified.is_some() && entry.modified == modified {
                debug!(path = %path.display(), "table cache hit");
                return Ok(Arc::clone(&entry.table));
            }
        }

        debug!(path = %path.display(), "table cache miss");
        let table = Arc::new(load_json_table(path)?);
        self.entries.write().insert(
            path.to_path_buf(),
            CachedTable {
                modified,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Drop the entry for `path`. Returns `true` if one existed.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        self.entries.write().remove(path.as_ref()).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries.read().contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for TableCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableCache")
            .field("entries", &self.len())
            .finish()
    }
}
