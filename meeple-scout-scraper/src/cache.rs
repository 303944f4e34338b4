//! Durable page cache for catalog fetches.
//!
//! Entries live under `~/.cache/meeple-scout/pages/`, one JSON document per
//! game, plus a `meta.json` version marker. Bumping [`CACHE_VERSION`] clears
//! caches written in an older layout on first use. Entries never expire on
//! their own; `clear` is the only invalidation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

/// Bump when the entry format changes; mismatched caches are cleared.
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheMeta {
    version: u32,
}

/// One cached fetch result: the page body, or a permanent "not found"
/// sentinel so repeated runs never re-request a dead id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CachedPage {
    Found { body: String, fetched: String },
    NotFound { fetched: String },
}

impl CachedPage {
    pub fn found(body: String) -> Self {
        Self::Found {
            body,
            fetched: timestamp(),
        }
    }

    pub fn not_found() -> Self {
        Self::NotFound {
            fetched: timestamp(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Per-entry listing info for `cache stats`.
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    pub game_id: u64,
    pub not_found: bool,
    pub size: u64,
}

/// On-disk page cache rooted at a single directory.
#[derive(Debug, Clone)]
pub struct PageCache {
    root: PathBuf,
}

impl PageCache {
    /// Open the cache at its default location under the user cache dir.
    pub fn open() -> Result<Self, ScrapeError> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| ScrapeError::cache("Could not determine cache directory"))?;
        Self::at(dir.join("meeple-scout").join("pages"))
    }

    /// Open a cache rooted at an explicit directory.
    pub fn at(root: impl Into<PathBuf>) -> Result<Self, ScrapeError> {
        let cache = Self { root: root.into() };
        fs::create_dir_all(&cache.root)?;
        cache.ensure_version()?;
        Ok(cache)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a cached page. Unreadable entries are treated as misses so a
    /// later `put` can heal them.
    pub fn get(&self, game_id: u64) -> Result<Option<CachedPage>, ScrapeError> {
        let path = self.entry_path(game_id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&contents) {
            Ok(page) => Ok(Some(page)),
            Err(e) => {
                log::warn!("Discarding unreadable cache entry {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    /// Store a page, committing atomically so concurrent readers never see a
    /// torn entry.
    pub fn put(&self, game_id: u64, page: &CachedPage) -> Result<(), ScrapeError> {
        let json = serde_json::to_string_pretty(page)?;
        write_atomic(&self.entry_path(game_id), &json)?;
        Ok(())
    }

    /// All entries, sorted by game id.
    pub fn list(&self) -> Result<Vec<CacheEntryInfo>, ScrapeError> {
        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name();
            let Some(game_id) = parse_entry_name(&name.to_string_lossy()) else {
                continue;
            };
            let size = dir_entry.metadata().map(|m| m.len()).unwrap_or(0);
            let not_found = match self.get(game_id)? {
                Some(page) => page.is_not_found(),
                None => continue,
            };
            entries.push(CacheEntryInfo {
                game_id,
                not_found,
                size,
            });
        }
        entries.sort_by_key(|e| e.game_id);
        Ok(entries)
    }

    /// Remove every entry and the version marker, returning freed bytes.
    pub fn clear(&self) -> Result<u64, ScrapeError> {
        let mut freed = 0u64;
        if !self.root.exists() {
            return Ok(0);
        }
        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            if !path.is_file() {
                continue;
            }
            freed += dir_entry.metadata().map(|m| m.len()).unwrap_or(0);
            fs::remove_file(&path)?;
        }
        Ok(freed)
    }

    fn entry_path(&self, game_id: u64) -> PathBuf {
        self.root.join(format!("game-{game_id}.json"))
    }

    fn meta_path(&self) -> PathBuf {
        self.root.join("meta.json")
    }

    /// Clear caches written by an incompatible layout, then stamp the
    /// current version.
    fn ensure_version(&self) -> Result<(), ScrapeError> {
        let meta_path = self.meta_path();
        let current = fs::read_to_string(&meta_path)
            .ok()
            .and_then(|contents| serde_json::from_str::<CacheMeta>(&contents).ok());
        match current {
            Some(meta) if meta.version == CACHE_VERSION => return Ok(()),
            Some(meta) => {
                log::warn!(
                    "Page cache version {} is stale (current {}), clearing",
                    meta.version,
                    CACHE_VERSION
                );
                self.clear()?;
            }
            None => {
                // no marker means a fresh dir or one predating version markers
                if fs::read_dir(&self.root)?.next().is_some() {
                    self.clear()?;
                }
            }
        }
        let meta = CacheMeta {
            version: CACHE_VERSION,
        };
        write_atomic(&meta_path, &serde_json::to_string_pretty(&meta)?)?;
        Ok(())
    }
}

fn parse_entry_name(name: &str) -> Option<u64> {
    name.strip_prefix("game-")?.strip_suffix(".json")?.parse().ok()
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Write-then-rename commit: a crash mid-write leaves the previous file
/// intact, never a partial one.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache() -> (tempfile::TempDir, PageCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = PageCache::at(dir.path().join("pages")).unwrap();
        (dir, cache)
    }

    #[test]
    fn test_get_missing_is_none() {
        let (_dir, cache) = temp_cache();
        assert!(cache.get(42).unwrap().is_none());
    }

    #[test]
    fn test_put_get_roundtrip() {
        let (_dir, cache) = temp_cache();
        let page = CachedPage::found("<html>Ark Nova</html>".to_string());
        cache.put(342942, &page).unwrap();

        let loaded = cache.get(342942).unwrap().unwrap();
        assert_eq!(loaded, page);
        // the commit leaves no temp file behind
        assert!(!cache.entry_path(342942).with_extension("json.tmp").exists());
    }

    #[test]
    fn test_not_found_sentinel() {
        let (_dir, cache) = temp_cache();
        cache.put(999, &CachedPage::not_found()).unwrap();
        assert!(cache.get(999).unwrap().unwrap().is_not_found());
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let (_dir, cache) = temp_cache();
        fs::write(cache.entry_path(7), "{ not json").unwrap();
        assert!(cache.get(7).unwrap().is_none());
    }

    #[test]
    fn test_list_sorted_with_sentinels() {
        let (_dir, cache) = temp_cache();
        cache.put(20, &CachedPage::not_found()).unwrap();
        cache.put(10, &CachedPage::found("body".to_string())).unwrap();

        let entries = cache.list().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].game_id, 10);
        assert!(!entries[0].not_found);
        assert_eq!(entries[1].game_id, 20);
        assert!(entries[1].not_found);
        assert!(entries[0].size > 0);
    }

    #[test]
    fn test_clear_reports_freed_bytes() {
        let (_dir, cache) = temp_cache();
        cache.put(1, &CachedPage::found("x".repeat(100))).unwrap();
        let freed = cache.clear().unwrap();
        assert!(freed > 100);
        assert!(cache.get(1).unwrap().is_none());
    }

    #[test]
    fn test_version_mismatch_clears_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pages");
        {
            let cache = PageCache::at(&root).unwrap();
            cache.put(5, &CachedPage::found("old".to_string())).unwrap();
        }
        // simulate an older layout
        fs::write(root.join("meta.json"), r#"{"version":0}"#).unwrap();

        let cache = PageCache::at(&root).unwrap();
        assert!(cache.get(5).unwrap().is_none());
    }

    #[test]
    fn test_reopen_same_version_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pages");
        {
            let cache = PageCache::at(&root).unwrap();
            cache.put(5, &CachedPage::found("keep".to_string())).unwrap();
        }
        let cache = PageCache::at(&root).unwrap();
        assert!(cache.get(5).unwrap().is_some());
    }
}
