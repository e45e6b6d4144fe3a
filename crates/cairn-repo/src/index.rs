use std::sync::Arc;

use cairn_store::{ContentStore, InMemoryContentStore, SharedObjectCache, StructureElement};
use cairn_types::ObjectKey;
use tracing::trace;

use crate::error::RepoResult;

/// Where a lookup may look.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// Local store first, then the shared cache (if attached).
    Cached,
    /// Local store only.
    Uncached,
}

/// A repository's content index: its own elements, optionally layered over a
/// process-wide [`SharedObjectCache`].
///
/// Writes always land in the local store. A cached lookup that misses locally
/// and hits the shared cache copies the element into the local store, so
/// anything a repository has resolved once stays resolvable without the
/// cache.
#[derive(Debug, Default)]
pub struct ContentIndex {
    local: InMemoryContentStore,
    cache: Option<Arc<SharedObjectCache>>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: Arc<SharedObjectCache>) -> Self {
        Self {
            local: InMemoryContentStore::new(),
            cache: Some(cache),
        }
    }

    pub fn cache(&self) -> Option<&Arc<SharedObjectCache>> {
        self.cache.as_ref()
    }

    /// The repository's own elements.
    pub fn local(&self) -> &InMemoryContentStore {
        &self.local
    }

    pub fn put(&self, element: &StructureElement) -> RepoResult<ObjectKey> {
        Ok(self.local.put(element)?)
    }

    pub fn get(&self, key: &ObjectKey, lookup: Lookup) -> RepoResult<Option<StructureElement>> {
        if let Some(found) = self.local.get(key)? {
            return Ok(Some(found));
        }
        let cache = match (lookup, &self.cache) {
            (Lookup::Cached, Some(cache)) => cache,
            _ => return Ok(None),
        };
        match cache.get(key)? {
            Some(found) => {
                trace!(key = %key.short_hex(), "promoted element from shared cache");
                self.local.put(&found)?;
                Ok(Some(found))
            }
            None => Ok(None),
        }
    }

    pub fn contains(&self, key: &ObjectKey, lookup: Lookup) -> RepoResult<bool> {
        if self.local.contains(key)? {
            return Ok(true);
        }
        match (lookup, &self.cache) {
            (Lookup::Cached, Some(cache)) => Ok(cache.contains(key)?),
            _ => Ok(false),
        }
    }

    /// Copy every local element the shared cache lacks into it. Returns how
    /// many were added; zero when no cache is attached.
    pub fn publish(&self) -> RepoResult<usize> {
        let Some(cache) = &self.cache else {
            return Ok(0);
        };
        let mut published = 0;
        for key in self.local.keys() {
            if cache.contains(&key)? {
                continue;
            }
            if let Some(element) = self.local.get(&key)? {
                cache.put(&element)?;
                published += 1;
            }
        }
        trace!(published, "published local elements to shared cache");
        Ok(published)
    }

    /// Number of locally held elements.
    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }
}
