use std::sync::atomic::{AtomicU64, Ordering};

use cairn_types::ObjectKey;

use crate::element::StructureElement;
use crate::error::StoreResult;
use crate::memory::InMemoryContentStore;
use crate::traits::ContentStore;

/// Hit/miss counters for a [`SharedObjectCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Process-wide element cache layered beneath repository content indexes.
///
/// Many repositories (one per in-flight message) may hold an `Arc` to the
/// same cache. The cache follows the same collision rule as every
/// [`ContentStore`]. Whether a lookup may consult it is decided by each call,
/// never by a flag on the cache itself.
#[derive(Debug, Default)]
pub struct SharedObjectCache {
    elements: InMemoryContentStore,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SharedObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop every cached element and reset the counters.
    pub fn clear(&self) {
        self.elements.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl ContentStore for SharedObjectCache {
    fn get(&self, key: &ObjectKey) -> StoreResult<Option<StructureElement>> {
        let found = self.elements.get(key)?;
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(found)
    }

    fn put(&self, element: &StructureElement) -> StoreResult<ObjectKey> {
        self.elements.put(element)
    }

    fn contains(&self, key: &ObjectKey) -> StoreResult<bool> {
        self.elements.contains(key)
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn keys(&self) -> Vec<ObjectKey> {
        self.elements.keys()
    }
}
