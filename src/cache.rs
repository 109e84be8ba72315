//! Per-build image memo.
//!
//! Several posts may reference the same image, and one post may list it
//! twice. Each distinct source file is identified (and its variants
//! generated) exactly once per build; every later reference reuses the
//! stored result.
//!
//! # Keys
//!
//! Entries are keyed by the **canonicalized** absolute path of the source
//! file, so `static/a.jpg` and `./static/a.jpg` (or a symlink to it) share
//! one entry while two different files can never share one. The value is
//! computed by a closure that receives the key itself, so nothing outside
//! the key can leak into the stored result.
//!
//! # Lifetime
//!
//! A memo is created empty at the start of a build and dropped at the end.
//! Nothing is persisted between builds.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Resolve the memo key for a path: absolute, with symlinks and `.`
/// components resolved. Fails if the file does not exist.
pub fn canonical_key(path: &Path) -> io::Result<PathBuf> {
    std::fs::canonicalize(path)
}

/// Memo of per-image results keyed by canonical path.
#[derive(Debug)]
pub struct ImageMemo<V> {
    entries: HashMap<PathBuf, V>,
    stats: MemoStats,
}

impl<V> Default for ImageMemo<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: MemoStats::default(),
        }
    }
}

impl<V> ImageMemo<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entry for `key`, computing it with `compute(key)` on the
    /// first request. A failed computation stores nothing.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: PathBuf,
        compute: impl FnOnce(&Path) -> Result<V, E>,
    ) -> Result<&V, E> {
        use std::collections::hash_map::Entry;
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                self.stats.hit();
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let value = compute(entry.key())?;
                self.stats.miss();
                Ok(entry.insert(value))
            }
        }
    }

    pub fn get(&self, key: &Path) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &MemoStats {
        &self.stats
    }

    /// Consume the memo, yielding its entries.
    pub fn into_entries(self) -> HashMap<PathBuf, V> {
        self.entries
    }
}

/// How often the memo answered from a stored entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u32,
    pub misses: u32,
}

impl MemoStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for MemoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} processed, {} reused ({} references)",
                self.misses,
                self.hits,
                self.total()
            )
        } else {
            write!(f, "{} processed", self.misses)
        }
    }
}
