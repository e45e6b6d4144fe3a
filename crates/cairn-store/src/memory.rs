use std::collections::HashMap;
use std::sync::RwLock;

use cairn_types::ObjectKey;
use tracing::debug;

use crate::element::StructureElement;
use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// In-memory, HashMap-based element store.
///
/// This is the content index owned by each repository. Elements are held
/// behind a `RwLock` and cloned on read.
pub struct InMemoryContentStore {
    elements: RwLock<HashMap<ObjectKey, StructureElement>>,
}

impl InMemoryContentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            elements: RwLock::new(HashMap::new()),
        }
    }

    /// Total bytes across all stored values.
    pub fn total_bytes(&self) -> u64 {
        self.elements
            .read()
            .expect("lock poisoned")
            .values()
            .map(|e| e.size() as u64)
            .sum()
    }

    /// Remove everything. Only callers that own the store outright (caches
    /// being reset, tests) should do this.
    pub fn clear(&self) {
        self.elements.write().expect("lock poisoned").clear();
    }

    /// Insert without verifying the key, to stage corrupt state in tests.
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&self, element: StructureElement) {
        self.elements.write().expect("lock poisoned").insert(element.key, element);
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryContentStore {
    fn clone(&self) -> Self {
        let map = self.elements.read().expect("lock poisoned").clone();
        Self {
            elements: RwLock::new(map),
        }
    }
}

impl ContentStore for InMemoryContentStore {
    fn get(&self, key: &ObjectKey) -> StoreResult<Option<StructureElement>> {
        let map = self.elements.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn put(&self, element: &StructureElement) -> StoreResult<ObjectKey> {
        if element.key.is_null() {
            return Err(StoreError::NullKey);
        }
        element.verify()?;

        let mut map = self.elements.write().expect("lock poisoned");
        if let Some(existing) = map.get(&element.key) {
            if !existing.same_content(element) {
                return Err(StoreError::HashCollision { key: element.key });
            }
            return Ok(element.key);
        }
        debug!(key = %element.key.short_hex(), leaf = element.is_leaf, size = element.size(), "stored element");
        map.insert(element.key, element.clone());
        Ok(element.key)
    }

    fn contains(&self, key: &ObjectKey) -> StoreResult<bool> {
        let map = self.elements.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    fn len(&self) -> usize {
        self.elements.read().expect("lock poisoned").len()
    }

    fn keys(&self) -> Vec<ObjectKey> {
        let map = self.elements.read().expect("lock poisoned");
        let mut keys: Vec<ObjectKey> = map.keys().copied().collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("element_count", &self.len())
            .finish()
    }
}
