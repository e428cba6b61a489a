//! Derived data cached per buffer version.
//!
//! Entries are keyed by buffer id and carry the version and a CRC-32 of the
//! text they were built from. A lookup hits only when both match, so a stale
//! entry is rebuilt even if a caller forgot to bump the version.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use snippet_bundle::FileBlockScan;
use snippet_editor::InspectIndex;
use snippet_engine::Engine;
use snippet_sourcemap::LineMap;

/// File-block scan of a persisted multi-file buffer, with its line map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferLayout {
    pub scan: FileBlockScan,
    pub line_map: LineMap,
}

impl BufferLayout {
    pub fn new(scan: FileBlockScan) -> Self {
        let line_map = scan.line_map();
        Self { scan, line_map }
    }

    /// Text of one buffer; `None` is the user-visible main buffer
    pub fn buffer(&self, file: Option<&str>) -> Option<&str> {
        match file {
            None => Some(snippet_bundle::strip_import_block(&self.scan.main_source)),
            Some(name) => self
                .scan
                .files
                .iter()
                .find(|(existing, _)| existing == name)
                .map(|(_, content)| content.as_str()),
        }
    }
}

struct Cached<T> {
    version: u64,
    fingerprint: u32,
    value: Arc<T>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
pub struct DerivedCache {
    layouts: Mutex<HashMap<String, Cached<BufferLayout>>>,
    indexes: Mutex<HashMap<String, Cached<InspectIndex>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DerivedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(&self, engine: &Engine, id: &str, version: u64, text: &str) -> Arc<BufferLayout> {
        self.lookup(&self.layouts, "layout", id, version, text, || {
            BufferLayout::new(engine.scan_file_blocks(text))
        })
    }

    pub fn inspect_index(&self, engine: &Engine, id: &str, version: u64, text: &str) -> Arc<InspectIndex> {
        self.lookup(&self.indexes, "inspect index", id, version, text, || {
            engine.build_inspect_index(text)
        })
    }

    fn lookup<T>(
        &self,
        map: &Mutex<HashMap<String, Cached<T>>>,
        what: &'static str,
        id: &str,
        version: u64,
        text: &str,
        build: impl FnOnce() -> T,
    ) -> Arc<T> {
        let fingerprint = crc32fast::hash(text.as_bytes());

        if let Some(cached) = map.lock().unwrap_or_else(PoisonError::into_inner).get(id) {
            if cached.version == version && cached.fingerprint == fingerprint {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(id, version, what, "derived cache hit");
                return cached.value.clone();
            }
            if cached.version == version {
                tracing::warn!(id, version, what, "buffer text changed without a version bump; rebuilding");
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(build());
        tracing::debug!(id, version, what, "derived data rebuilt");
        map.lock().unwrap_or_else(PoisonError::into_inner).insert(
            id.to_string(),
            Cached {
                version,
                fingerprint,
                value: value.clone(),
            },
        );
        value
    }

    /// Drop everything derived from buffer `id`
    pub fn invalidate(&self, id: &str) {
        self.layouts.lock().unwrap_or_else(PoisonError::into_inner).remove(id);
        self.indexes.lock().unwrap_or_else(PoisonError::into_inner).remove(id);
    }

    pub fn clear(&self) {
        self.layouts.lock().unwrap_or_else(PoisonError::into_inner).clear();
        self.indexes.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for DerivedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snippet_engine::EngineConfig;

    #[test]
    fn test_hit_on_same_version() {
        let engine = Engine::reference(EngineConfig::default());
        let cache = DerivedCache::new();
        let a = cache.inspect_index(&engine, "main", 1, "<a>x</a>");
        let b = cache.inspect_index(&engine, "main", 1, "<a>x</a>");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_new_version_rebuilds() {
        let engine = Engine::reference(EngineConfig::default());
        let cache = DerivedCache::new();
        cache.inspect_index(&engine, "main", 1, "<a>x</a>");
        let index = cache.inspect_index(&engine, "main", 2, "<a><b>x</b></a>");
        assert_eq!(index.len(), 2);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_fingerprint_mismatch_rebuilds() {
        let engine = Engine::reference(EngineConfig::default());
        let cache = DerivedCache::new();
        cache.inspect_index(&engine, "main", 1, "<a>x</a>");
        let index = cache.inspect_index(&engine, "main", 1, "<a><b>x</b></a>");
        assert_eq!(index.len(), 2);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2 });
    }

    #[test]
    fn test_invalidate() {
        let engine = Engine::reference(EngineConfig::default());
        let cache = DerivedCache::new();
        let source = "// @snippet-file a.tsx\nexport const A = 1;\n// @snippet-file-end\nmain();\n";
        let layout = cache.layout(&engine, "doc", 1, source);
        assert_eq!(layout.buffer(Some("a.tsx")), Some("export const A = 1;"));
        assert_eq!(layout.buffer(None), Some("main();\n"));
        cache.invalidate("doc");
        cache.layout(&engine, "doc", 1, source);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2 });
    }
}
