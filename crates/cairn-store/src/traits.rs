use cairn_types::ObjectKey;

use crate::element::StructureElement;
use crate::error::StoreResult;

/// Content-addressed element store.
///
/// All implementations must satisfy these invariants:
/// - Every stored key equals the hash of its element's value; `put` checks it.
/// - `put` of identical content under an existing key is a no-op.
/// - `put` of different content under an existing key fails with
///   [`StoreError::HashCollision`](crate::StoreError::HashCollision) and leaves
///   the stored element untouched.
/// - Missing keys read as `Ok(None)`; the store never invents data.
/// - Concurrent reads are always safe (elements are immutable).
pub trait ContentStore: Send + Sync {
    /// Read an element by key.
    fn get(&self, key: &ObjectKey) -> StoreResult<Option<StructureElement>>;

    /// Store an element and return its key.
    fn put(&self, element: &StructureElement) -> StoreResult<ObjectKey>;

    /// Check whether a key is present.
    fn contains(&self, key: &ObjectKey) -> StoreResult<bool>;

    /// Number of stored elements.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored keys, sorted.
    fn keys(&self) -> Vec<ObjectKey>;

    /// Read several elements. Missing keys yield `None` at their position.
    fn get_batch(&self, keys: &[ObjectKey]) -> StoreResult<Vec<Option<StructureElement>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Store several elements, stopping at the first failure.
    fn put_batch(&self, elements: &[StructureElement]) -> StoreResult<Vec<ObjectKey>> {
        elements.iter().map(|e| self.put(e)).collect()
    }
}
