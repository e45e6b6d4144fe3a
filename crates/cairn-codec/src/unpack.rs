use std::collections::BTreeSet;
use std::sync::Arc;

use cairn_refs::DEFAULT_BRANCH;
use cairn_repo::Repository;
use cairn_store::{BackingStore, SharedObjectCache, StructureElement};
use cairn_types::ObjectType;
use tracing::{debug, info};

use crate::config::CodecConfig;
use crate::container::Container;
use crate::error::CodecResult;
use crate::message::{Decoded, RootObject};

/// Rebuild a repository from a container.
///
/// The repository is populated privately and only returned once every
/// non-excluded link resolves, it has been committed, and `master` points at
/// that commit. On any error the partial repository is dropped. On success
/// the received elements are published to the shared cache, if one is given.
pub fn unpack(
    container: Container,
    config: &CodecConfig,
    cache: Option<Arc<SharedObjectCache>>,
) -> CodecResult<Decoded> {
    let (repo, root) = seed(container, cache)?;
    let excluded = declared_excluded(&root)?;
    repo.load_links(&root.key, &excluded)?;
    finish(repo, root, excluded, config)
}

/// [`unpack`], but references missing from the container are first fetched
/// from `backing` before they count as dangling.
pub async fn unpack_with_backing(
    container: Container,
    config: &CodecConfig,
    cache: Option<Arc<SharedObjectCache>>,
    backing: &dyn BackingStore,
) -> CodecResult<Decoded> {
    let (mut repo, root) = seed(container, cache)?;
    let excluded = declared_excluded(&root)?;
    if let Err(e) = repo.load_links(&root.key, &excluded) {
        if !e.is_dangling_reference() {
            return Err(e.into());
        }
        let fetched = repo.hydrate(backing).await?;
        debug!(fetched, "hydrated missing references from backing store");
        repo.load_links(&root.key, &excluded)?;
    }
    finish(repo, root, excluded, config)
}

fn seed(container: Container, cache: Option<Arc<SharedObjectCache>>) -> CodecResult<(Repository, StructureElement)> {
    let mut repo = match cache {
        Some(cache) => Repository::with_cache(cache),
        None => Repository::new(),
    };
    let (head, items) = container.into_parts();
    repo.put_element(&head)?;
    for item in &items {
        repo.put_element(item)?;
    }
    repo.set_root(head.key)?;
    Ok((repo, head))
}

fn declared_excluded(root: &StructureElement) -> CodecResult<BTreeSet<ObjectType>> {
    Ok(root
        .body()?
        .map(|body| body.excluded_types.into_iter().collect())
        .unwrap_or_default())
}

fn finish(
    mut repo: Repository,
    root: StructureElement,
    excluded: BTreeSet<ObjectType>,
    config: &CodecConfig,
) -> CodecResult<Decoded> {
    repo.declare_excluded(excluded);
    let commit = repo.commit(&config.received_comment)?;
    repo.branch(DEFAULT_BRANCH)?;
    let published = repo.publish_to_cache()?;
    info!(
        root = %root.key.short_hex(),
        commit = %commit.short_hex(),
        elements = repo.index().len(),
        published,
        "unpacked container"
    );
    Decoded::dispatch(RootObject::new(repo, root))
}
