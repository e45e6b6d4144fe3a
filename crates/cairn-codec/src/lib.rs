//! Container codec for Cairn.
//!
//! Packs a repository's committed object graph into a self-contained,
//! checksummed byte container and rebuilds an equivalent repository from one.
//!
//! # Architecture
//!
//! - **Wire format** ([`wire`]): element records with CRC32 per value,
//!   optional zstd compression, and a BLAKE3 trailer
//! - **Container**: the head element plus everything it reaches, no repeats
//! - **pack / unpack**: repository to container and back, including commit
//!   and `master` branch creation on the receiving side
//! - **Dispatch**: unpacked roots of the message envelope type get a
//!   [`MessageView`], everything else a plain [`RootObject`]
//! - **Interceptor**: the codec as a pipeline stage keyed on the declared
//!   encoding

pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod interceptor;
pub mod message;
pub mod pack;
pub mod unpack;
pub mod wire;

pub use codec::ObjectCodec;
pub use config::CodecConfig;
pub use container::Container;
pub use error::{CodecError, CodecResult};
pub use interceptor::{Content, Envelope, Interceptor, ObjectCodecInterceptor, PassThrough};
pub use message::{Decoded, MessageEnvelope, MessageView, RootObject, MESSAGE_ENVELOPE_TYPE};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use cairn_repo::{Lookup, RepoStatus, Repository};
    use cairn_store::{
        BackingStore, ContentStore, InMemoryBackingStore, Link, NodeBody, SharedObjectCache, StructureElement,
    };
    use cairn_types::{ObjectKey, ObjectType};
    use proptest::prelude::*;

    const BLOB: ObjectType = ObjectType::new(1, 1);
    const TREE: ObjectType = ObjectType::new(2, 1);
    const SIDECAR: ObjectType = ObjectType::new(9, 1);

    fn none() -> BTreeSet<ObjectType> {
        BTreeSet::new()
    }

    fn node(repo: &mut Repository, data: &str, children: &[&StructureElement]) -> StructureElement {
        let body = children
            .iter()
            .fold(NodeBody::new().with_data(data.as_bytes()), |b, c| b.with_link(Link::to(c)));
        let element = StructureElement::node(TREE, &body).unwrap();
        repo.put_element(&element).unwrap();
        element
    }

    fn leaf(repo: &mut Repository, data: &str) -> StructureElement {
        let element = StructureElement::leaf(BLOB, data.as_bytes().to_vec());
        repo.put_element(&element).unwrap();
        element
    }

    /// R -> {A, B}, A -> C, B -> C
    fn diamond() -> (Repository, [StructureElement; 4]) {
        let mut repo = Repository::new();
        let c = leaf(&mut repo, "C");
        let a = node(&mut repo, "A", &[&c]);
        let b = node(&mut repo, "B", &[&c]);
        let r = node(&mut repo, "R", &[&a, &b]);
        repo.set_root(r.key).unwrap();
        (repo, [r, a, b, c])
    }

    // -----------------------------------------------------------------------
    // Pack
    // -----------------------------------------------------------------------

    #[test]
    fn diamond_packs_each_element_once() {
        let (mut repo, [r, a, b, c]) = diamond();
        let container = pack::pack(&mut repo, &none(), &CodecConfig::default()).unwrap();
        assert_eq!(container.head().key, r.key);
        assert_eq!(container.keys(), vec![r.key, a.key, b.key, c.key]);
    }

    #[test]
    fn pack_auto_commits() {
        let (mut repo, _) = diamond();
        assert_eq!(repo.status(), RepoStatus::Modified);
        ObjectCodec::default().pack(&mut repo, &none()).unwrap();
        assert_eq!(repo.status(), RepoStatus::UpToDate);
        assert_eq!(repo.commits().len(), 1);
        assert_eq!(repo.commits()[0].comment, CodecConfig::default().auto_commit_comment);
    }

    #[test]
    fn pack_of_committed_repo_adds_no_commit() {
        let (mut repo, _) = diamond();
        repo.commit("mine").unwrap();
        ObjectCodec::default().pack(&mut repo, &none()).unwrap();
        assert_eq!(repo.commits().len(), 1);
    }

    #[test]
    fn pack_without_root_fails() {
        let mut repo = Repository::new();
        let err = ObjectCodec::default().pack(&mut repo, &none()).unwrap_err();
        assert!(matches!(err, CodecError::Repository(cairn_repo::RepoError::Commit(_))));
    }

    #[test]
    fn pack_dangling_reference_fails() {
        let mut repo = Repository::new();
        let ghost = StructureElement::leaf(BLOB, b"ghost".to_vec());
        let r = node(&mut repo, "R", &[&ghost]);
        repo.set_root(r.key).unwrap();
        let err = ObjectCodec::default().pack(&mut repo, &none()).unwrap_err();
        assert!(err.is_dangling_reference());
    }

    #[test]
    fn pack_never_reads_shared_cache() {
        let cache = Arc::new(SharedObjectCache::new());
        let shared = StructureElement::leaf(BLOB, b"cached only".to_vec());
        cache.put(&shared).unwrap();

        let mut repo = Repository::with_cache(Arc::clone(&cache));
        let r = node(&mut repo, "R", &[&shared]);
        repo.set_root(r.key).unwrap();

        // Committing resolves the cached child into the repository.
        repo.commit("resolved through cache").unwrap();
        let before = cache.stats();
        let container = pack::pack(&mut repo, &none(), &CodecConfig::default()).unwrap();
        assert_eq!(container.keys(), vec![r.key, shared.key]);
        assert_eq!(cache.stats(), before);
    }

    // -----------------------------------------------------------------------
    // Round trip
    // -----------------------------------------------------------------------

    #[test]
    fn diamond_round_trip() {
        let (mut repo, [r, a, b, c]) = diamond();
        let codec = ObjectCodec::default();
        let bytes = codec.pack(&mut repo, &none()).unwrap();

        let decoded = codec.unpack(&bytes).unwrap();
        assert!(!decoded.is_message());
        let received = decoded.repository();
        assert_eq!(received.root(), Some(r.key));
        assert_eq!(received.status(), RepoStatus::UpToDate);
        assert_eq!(received.commits().len(), 1);
        assert_eq!(received.commits()[0].comment, "received");
        assert_eq!(received.index().len(), 4);
        for element in [&r, &a, &b, &c] {
            assert_eq!(received.get(&element.key, Lookup::Uncached).unwrap().as_ref(), Some(element));
        }

        let branches = received.branches().unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "master");
        assert_eq!(Some(branches[0].head), received.head_commit().map(|c| c.id));
    }

    #[test]
    fn equal_values_of_different_types_round_trip() {
        let mut repo = Repository::new();
        let blob = leaf(&mut repo, "");
        let sidecar = StructureElement::leaf(SIDECAR, Vec::new());
        repo.put_element(&sidecar).unwrap();
        let r = node(&mut repo, "R", &[&blob, &sidecar]);
        repo.set_root(r.key).unwrap();

        let codec = ObjectCodec::default();
        let bytes = codec.pack(&mut repo, &none()).unwrap();
        let decoded = codec.unpack(&bytes).unwrap();
        let received = decoded.repository();
        assert_eq!(received.index().len(), 3);
        for element in [&blob, &sidecar] {
            assert_eq!(received.get(&element.key, Lookup::Uncached).unwrap().as_ref(), Some(element));
        }
    }

    #[test]
    fn unpacked_repository_repacks_identically() {
        let (mut repo, _) = diamond();
        let codec = ObjectCodec::default();
        let bytes = codec.pack(&mut repo, &none()).unwrap();
        let mut decoded = codec.unpack(&bytes).unwrap();
        let (again, tag) = codec.encode(&mut decoded).unwrap();
        assert_eq!(again, bytes);
        assert_eq!(tag, "cairn-container-v1");
        assert_eq!(decoded.repository().commits().len(), 1);
    }

    #[test]
    fn single_leaf_round_trip() {
        let mut repo = Repository::new();
        let key = repo.write_leaf(BLOB, b"solo".to_vec()).unwrap();
        repo.set_root(key).unwrap();
        let codec = ObjectCodec::default();
        let decoded = codec.unpack(&codec.pack(&mut repo, &none()).unwrap()).unwrap();
        assert_eq!(decoded.root().key(), key);
        assert_eq!(decoded.root().element().value, b"solo");
    }

    #[test]
    fn deduplicated_value_under_two_parents() {
        let mut repo = Repository::new();
        let shared = leaf(&mut repo, "same bytes");
        let left = node(&mut repo, "left", &[&shared]);
        let right = node(&mut repo, "right", &[&shared, &shared]);
        let r = node(&mut repo, "R", &[&left, &right]);
        repo.set_root(r.key).unwrap();

        let container = pack::pack(&mut repo, &none(), &CodecConfig::default()).unwrap();
        let occurrences = container.keys().iter().filter(|k| **k == shared.key).count();
        assert_eq!(occurrences, 1);
        assert_eq!(container.len(), 4);
    }

    // -----------------------------------------------------------------------
    // Excluded types
    // -----------------------------------------------------------------------

    #[test]
    fn excluded_type_is_tolerated_end_to_end() {
        let mut repo = Repository::new();
        let sidecar = StructureElement::leaf(SIDECAR, b"kept at home".to_vec());
        let kept = leaf(&mut repo, "kept");
        let body = NodeBody::new()
            .with_link(Link::to(&sidecar))
            .with_link(Link::to(&kept))
            .with_excluded(SIDECAR);
        let r = repo.write_node(TREE, &body).unwrap();
        repo.set_root(r).unwrap();

        let codec = ObjectCodec::default();
        let bytes = codec.pack(&mut repo, &none()).unwrap();
        let decoded = codec.unpack(&bytes).unwrap();
        let received = decoded.repository();
        assert!(received.excluded_types().contains(&SIDECAR));
        assert!(received.get(&sidecar.key, Lookup::Uncached).unwrap().is_none());
        assert!(received.get(&kept.key, Lookup::Uncached).unwrap().is_some());
    }

    #[test]
    fn caller_excluded_types_apply_to_pack_only() {
        let mut repo = Repository::new();
        let sidecar = StructureElement::leaf(SIDECAR, b"kept at home".to_vec());
        let r = node(&mut repo, "R", &[&sidecar]);
        repo.set_root(r.key).unwrap();

        let codec = ObjectCodec::default();
        let bytes = codec.pack(&mut repo, &BTreeSet::from([SIDECAR])).unwrap();
        // The receiver was never told the type is excluded.
        let err = codec.unpack(&bytes).unwrap_err();
        assert!(err.is_dangling_reference());
    }

    #[test]
    fn present_excluded_type_is_still_shipped() {
        let mut repo = Repository::new();
        let sidecar = StructureElement::leaf(SIDECAR, b"here".to_vec());
        repo.put_element(&sidecar).unwrap();
        let r = node(&mut repo, "R", &[&sidecar]);
        repo.set_root(r.key).unwrap();

        let container = pack::pack(&mut repo, &BTreeSet::from([SIDECAR]), &CodecConfig::default()).unwrap();
        assert_eq!(container.keys(), vec![r.key, sidecar.key]);
    }

    // -----------------------------------------------------------------------
    // Unpack failures
    // -----------------------------------------------------------------------

    #[test]
    fn empty_container_is_rejected() {
        let config = CodecConfig::default();
        let bytes = wire::encode(std::iter::empty(), &config).unwrap();
        let err = ObjectCodec::new(config).unpack(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::EmptyContainer));
    }

    #[test]
    fn corrupt_bytes_are_rejected() {
        let (mut repo, _) = diamond();
        let codec = ObjectCodec::default();
        let mut bytes = codec.pack(&mut repo, &none()).unwrap();
        let middle = bytes.len() / 2;
        bytes[middle] ^= 0x55;
        assert!(matches!(codec.unpack(&bytes), Err(CodecError::Decode(_))));
        assert!(matches!(codec.unpack(b"definitely not a container"), Err(CodecError::Decode(_))));
    }

    #[test]
    fn container_missing_child_is_dangling() {
        let (_, [r, a, b, _c]) = diamond();
        let config = CodecConfig::default();
        let bytes = Container::new(r, vec![a, b]).unwrap().to_bytes(&config).unwrap();
        let err = ObjectCodec::new(config).unpack(&bytes).unwrap_err();
        assert!(err.is_dangling_reference());
    }

    #[test]
    fn shared_cache_fills_gaps_on_unpack() {
        let (_, [r, a, b, c]) = diamond();
        let cache = Arc::new(SharedObjectCache::new());
        cache.put(&c).unwrap();

        let config = CodecConfig::default();
        let bytes = Container::new(r.clone(), vec![a, b]).unwrap().to_bytes(&config).unwrap();
        let decoded = ObjectCodec::new(config).with_cache(cache).unpack(&bytes).unwrap();
        assert_eq!(decoded.root().key(), r.key);
        assert!(decoded.repository().get(&c.key, Lookup::Uncached).unwrap().is_some());
    }

    #[test]
    fn unpack_publishes_received_elements_to_cache() {
        let (mut repo, [r, a, b, c]) = diamond();
        let cache = Arc::new(SharedObjectCache::new());
        let codec = ObjectCodec::default().with_cache(Arc::clone(&cache));
        codec.unpack(&codec.pack(&mut repo, &none()).unwrap()).unwrap();
        for element in [&r, &a, &b, &c] {
            assert!(cache.contains(&element.key).unwrap());
        }

        // A later container that leaves out the shared child still resolves.
        let config = CodecConfig::default();
        let partial = Container::new(a.clone(), Vec::new()).unwrap().to_bytes(&config).unwrap();
        let decoded = codec.unpack(&partial).unwrap();
        assert!(decoded.repository().get(&c.key, Lookup::Uncached).unwrap().is_some());
    }

    #[test]
    fn failed_unpack_publishes_nothing() {
        let (_, [r, a, b, _c]) = diamond();
        let cache = Arc::new(SharedObjectCache::new());
        let config = CodecConfig::default();
        let bytes = Container::new(r, vec![a, b]).unwrap().to_bytes(&config).unwrap();
        let err = ObjectCodec::new(config).with_cache(Arc::clone(&cache)).unpack(&bytes).unwrap_err();
        assert!(err.is_dangling_reference());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn backing_store_fills_gaps_on_unpack() {
        let (_, [r, a, b, c]) = diamond();
        let backing = InMemoryBackingStore::new();
        backing.push(&[c.clone()]).await.unwrap();

        let config = CodecConfig::default();
        let bytes = Container::new(r, vec![a, b]).unwrap().to_bytes(&config).unwrap();
        let codec = ObjectCodec::new(config);
        assert!(codec.unpack(&bytes).unwrap_err().is_dangling_reference());

        let decoded = codec.unpack_with_backing(&bytes, &backing).await.unwrap();
        assert!(decoded.repository().get(&c.key, Lookup::Uncached).unwrap().is_some());
        assert!(decoded.repository().is_up_to_date());
    }

    #[tokio::test]
    async fn backing_store_without_the_object_still_fails() {
        let (_, [r, a, b, _c]) = diamond();
        let config = CodecConfig::default();
        let bytes = Container::new(r, vec![a, b]).unwrap().to_bytes(&config).unwrap();
        let err = ObjectCodec::new(config)
            .unpack_with_backing(&bytes, &InMemoryBackingStore::new())
            .await
            .unwrap_err();
        assert!(err.is_dangling_reference());
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    #[test]
    fn message_envelope_round_trip() {
        let mut repo = Repository::new();
        let payload = leaf(&mut repo, "payload");
        let sidecar = StructureElement::leaf(SIDECAR, b"not sent".to_vec());
        let inner = node(&mut repo, "inner", &[&payload, &sidecar]);
        MessageEnvelope::new(Link::to(&inner))
            .with_data(b"headers".to_vec())
            .with_excluded(SIDECAR)
            .write(&mut repo)
            .unwrap();

        let codec = ObjectCodec::default();
        let decoded = codec.unpack(&codec.pack(&mut repo, &none()).unwrap()).unwrap();
        let view = decoded.as_message().expect("message view");
        assert_eq!(view.root().object_type(), MESSAGE_ENVELOPE_TYPE);
        assert_eq!(view.message_type(), Some(TREE));
        assert_eq!(view.message_object().unwrap(), Some(inner));
        assert_eq!(view.data(), b"headers");
        assert_eq!(view.excluded_types(), &[SIDECAR]);
        assert!(view.repository().excluded_types().contains(&SIDECAR));
    }

    // -----------------------------------------------------------------------
    // Entry points and interceptor
    // -----------------------------------------------------------------------

    #[test]
    fn decode_only_handles_our_encoding() {
        let (mut repo, [r, ..]) = diamond();
        let codec = ObjectCodec::default();
        let (bytes, tag) = codec.encode_repository(&mut repo).unwrap();
        assert!(codec.decode(&bytes, Some("application/json")).unwrap().is_none());
        assert!(codec.decode(&bytes, None).unwrap().is_none());
        let decoded = codec.decode(&bytes, Some(tag.as_str())).unwrap().expect("decoded");
        assert_eq!(decoded.root().key(), r.key);
    }

    #[tokio::test]
    async fn interceptor_decodes_and_encodes() {
        let (mut repo, [r, ..]) = diamond();
        let codec = ObjectCodec::default();
        let (bytes, tag) = codec.encode_repository(&mut repo).unwrap();
        let interceptor = ObjectCodecInterceptor::new(codec);

        let inbound = interceptor
            .before(Envelope::new(Some(tag.clone()), Content::Raw(bytes.clone())))
            .await
            .unwrap();
        let decoded = match &inbound.content {
            Content::Object(decoded) => decoded,
            other => panic!("expected object, got {other:?}"),
        };
        assert_eq!(decoded.root().key(), r.key);

        let outbound = interceptor.after(inbound).await.unwrap();
        assert_eq!(outbound.encoding.as_deref(), Some(tag.as_str()));
        assert!(matches!(outbound.content, Content::Raw(ref out) if *out == bytes));
    }

    #[tokio::test]
    async fn interceptor_passes_foreign_content_through() {
        let interceptor = ObjectCodecInterceptor::new(ObjectCodec::default());

        let raw = interceptor
            .before(Envelope::new(Some("text/plain".into()), Content::Raw(b"hi".to_vec())))
            .await
            .unwrap();
        assert!(matches!(raw.content, Content::Raw(ref b) if b == b"hi"));
        assert_eq!(raw.encoding.as_deref(), Some("text/plain"));

        let json = interceptor
            .after(Envelope::new(None, Content::Other(serde_json::json!({"k": 1}))))
            .await
            .unwrap();
        assert!(matches!(json.content, Content::Other(_)));
        assert!(json.encoding.is_none());
    }

    #[tokio::test]
    async fn interceptor_with_backing_hydrates() {
        let (_, [r, a, b, c]) = diamond();
        let backing = Arc::new(InMemoryBackingStore::new());
        backing.push(&[c]).await.unwrap();

        let codec = ObjectCodec::default();
        let bytes = Container::new(r, vec![a, b]).unwrap().to_bytes(codec.config()).unwrap();
        let tag = codec.encoding_tag().to_string();
        let interceptor = ObjectCodecInterceptor::new(codec).with_backing(backing);
        let inbound = interceptor.before(Envelope::new(Some(tag), Content::Raw(bytes))).await.unwrap();
        assert!(matches!(inbound.content, Content::Object(_)));
    }

    #[tokio::test]
    async fn pass_through_changes_nothing() {
        let envelope = Envelope::new(Some("x".into()), Content::Raw(vec![1, 2, 3]));
        let out = PassThrough.before(envelope).await.unwrap();
        let out = PassThrough.after(out).await.unwrap();
        assert!(matches!(out.content, Content::Raw(ref b) if *b == vec![1u8, 2, 3]));
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_unpacks_share_a_cache() {
        let cache = Arc::new(SharedObjectCache::new());
        let codec = ObjectCodec::default().with_cache(Arc::clone(&cache));
        let (mut repo, [r, ..]) = diamond();
        let bytes = Arc::new(codec.pack(&mut repo, &none()).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let codec = codec.clone();
                let bytes = Arc::clone(&bytes);
                std::thread::spawn(move || codec.unpack(&bytes).unwrap().root().key())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().expect("thread should not panic"), r.key);
        }
    }

    // -----------------------------------------------------------------------
    // Property: any DAG survives a round trip
    // -----------------------------------------------------------------------

    fn build_dag(shape: &[(Vec<u8>, Vec<prop::sample::Index>)]) -> (Repository, Vec<StructureElement>) {
        let mut repo = Repository::new();
        let mut built: Vec<StructureElement> = Vec::new();
        for (i, (data, picks)) in shape.iter().enumerate() {
            let element = if i == 0 || picks.is_empty() {
                StructureElement::leaf(BLOB, [&[i as u8][..], data].concat())
            } else {
                let body = picks.iter().fold(NodeBody::new().with_data([&[i as u8][..], data].concat()), |b, p| {
                    b.with_link(Link::to(&built[p.index(i)]))
                });
                StructureElement::node(TREE, &body).unwrap()
            };
            repo.put_element(&element).unwrap();
            built.push(element);
        }
        let root = built.last().map(|e| e.key).unwrap_or_else(ObjectKey::null);
        repo.set_root(root).unwrap();
        (repo, built)
    }

    proptest! {
        #[test]
        fn random_dag_round_trips(
            shape in prop::collection::vec(
                (prop::collection::vec(any::<u8>(), 0..64), prop::collection::vec(any::<prop::sample::Index>(), 0..4)),
                1..16,
            )
        ) {
            let (mut repo, _) = build_dag(&shape);
            let root = repo.root().unwrap();
            let expected = repo.load_links(&root, &BTreeSet::new()).unwrap();

            let codec = ObjectCodec::default();
            let bytes = codec.pack(&mut repo, &BTreeSet::new()).unwrap();
            let decoded = codec.unpack(&bytes).unwrap();
            let received = decoded.repository();

            prop_assert_eq!(received.root(), Some(root));
            prop_assert_eq!(received.index().len(), expected.reachable.len() + 1);
            for element in &expected.reachable {
                let got = received.get(&element.key, Lookup::Uncached).unwrap();
                prop_assert_eq!(got.as_ref(), Some(element));
            }
        }
    }
}
