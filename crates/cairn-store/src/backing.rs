use async_trait::async_trait;
use cairn_types::ObjectKey;
use tracing::debug;

use crate::element::{Link, StructureElement};
use crate::error::StoreResult;
use crate::memory::InMemoryContentStore;
use crate::traits::ContentStore;

/// Acknowledgement returned by [`BackingStore::push`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PushAck {
    /// Elements the store did not hold before.
    pub accepted: usize,
    /// Elements the store already held.
    pub already_present: usize,
}

/// Durable store behind a repository (mutable, commit and blob stores).
///
/// Repositories use it to persist elements and to hydrate elements that are
/// referenced but not held locally. Lookups that find nothing return fewer
/// elements than requested; they never fabricate content.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Persist elements.
    async fn push(&self, elements: &[StructureElement]) -> StoreResult<PushAck>;

    /// Retrieve the elements stored under `keys` that the store holds.
    async fn pull(&self, keys: &[ObjectKey]) -> StoreResult<Vec<StructureElement>>;

    /// Retrieve the targets of `links` that the store holds.
    async fn fetch_linked_objects(&self, links: &[Link]) -> StoreResult<Vec<StructureElement>>;
}

/// In-memory [`BackingStore`] for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryBackingStore {
    elements: InMemoryContentStore,
}

impl InMemoryBackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements held.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Direct access to the held elements.
    pub fn contents(&self) -> &InMemoryContentStore {
        &self.elements
    }
}

#[async_trait]
impl BackingStore for InMemoryBackingStore {
    async fn push(&self, elements: &[StructureElement]) -> StoreResult<PushAck> {
        let mut ack = PushAck::default();
        for element in elements {
            if self.elements.contains(&element.key)? {
                ack.already_present += 1;
            }
            self.elements.put(element)?;
        }
        ack.accepted = elements.len() - ack.already_present;
        debug!(accepted = ack.accepted, already_present = ack.already_present, "backing store push");
        Ok(ack)
    }

    async fn pull(&self, keys: &[ObjectKey]) -> StoreResult<Vec<StructureElement>> {
        Ok(self.elements.get_batch(keys)?.into_iter().flatten().collect())
    }

    async fn fetch_linked_objects(&self, links: &[Link]) -> StoreResult<Vec<StructureElement>> {
        let keys: Vec<ObjectKey> = links.iter().map(|l| l.key).collect();
        self.pull(&keys).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_types::ObjectType;

    const BLOB: ObjectType = ObjectType::new(1, 1);

    #[tokio::test]
    async fn push_reports_new_and_existing() {
        let store = InMemoryBackingStore::new();
        let a = StructureElement::leaf(BLOB, b"a".to_vec());
        let b = StructureElement::leaf(BLOB, b"b".to_vec());

        let first = store.push(&[a.clone()]).await.unwrap();
        assert_eq!(first, PushAck { accepted: 1, already_present: 0 });

        let second = store.push(&[a, b]).await.unwrap();
        assert_eq!(second, PushAck { accepted: 1, already_present: 1 });
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn pull_skips_missing() {
        let store = InMemoryBackingStore::new();
        let a = StructureElement::leaf(BLOB, b"a".to_vec());
        store.push(&[a.clone()]).await.unwrap();

        let got = store.pull(&[a.key, ObjectKey::digest(b"missing")]).await.unwrap();
        assert_eq!(got, vec![a]);
    }

    #[tokio::test]
    async fn fetch_linked_objects_follows_link_keys() {
        let store = InMemoryBackingStore::new();
        let a = StructureElement::leaf(BLOB, b"a".to_vec());
        store.push(&[a.clone()]).await.unwrap();

        let got = store.fetch_linked_objects(&[Link::to(&a)]).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].key, a.key);
    }
}
