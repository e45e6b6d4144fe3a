use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::Utc;
use cairn_refs::{Branch, InMemoryRefStore, RefStore};
use cairn_store::{BackingStore, NodeBody, PushAck, SharedObjectCache, StructureElement};
use cairn_types::{ObjectKey, ObjectType};
use tracing::{debug, info};

use crate::commit::{Commit, CommitLog};
use crate::error::{RepoError, RepoResult};
use crate::index::{ContentIndex, Lookup};
use crate::resolver::{Traversal, TraversalResult};
use crate::status::RepoStatus;

/// An object graph with history.
///
/// Content is append-only: elements are never removed, so the only graph
/// change is moving the root. Moving the root marks the repository
/// [`RepoStatus::Modified`]; committing makes it [`RepoStatus::UpToDate`].
///
/// Every mutating operation takes `&mut self`, which gives one writer at a
/// time per repository. Independent repositories may share a
/// [`SharedObjectCache`] and be used from different tasks.
#[derive(Debug)]
pub struct Repository {
    index: ContentIndex,
    root: Option<ObjectKey>,
    status: RepoStatus,
    commits: CommitLog,
    refs: InMemoryRefStore,
    excluded_types: BTreeSet<ObjectType>,
}

impl Default for Repository {
    fn default() -> Self {
        Self::from_index(ContentIndex::new())
    }
}

impl Repository {
    /// An empty repository with no root and no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty repository whose cached lookups fall through to `cache`.
    pub fn with_cache(cache: Arc<SharedObjectCache>) -> Self {
        Self::from_index(ContentIndex::with_cache(cache))
    }

    fn from_index(index: ContentIndex) -> Self {
        Self {
            index,
            root: None,
            status: RepoStatus::Modified,
            commits: CommitLog::new(),
            refs: InMemoryRefStore::new(),
            excluded_types: BTreeSet::new(),
        }
    }

    // ---- Content ----

    pub fn index(&self) -> &ContentIndex {
        &self.index
    }

    /// Add an element to the content index. Does not change the root.
    pub fn put_element(&mut self, element: &StructureElement) -> RepoResult<ObjectKey> {
        self.index.put(element)
    }

    pub fn write_leaf(&mut self, object_type: ObjectType, value: impl Into<Vec<u8>>) -> RepoResult<ObjectKey> {
        self.put_element(&StructureElement::leaf(object_type, value))
    }

    pub fn write_node(&mut self, object_type: ObjectType, body: &NodeBody) -> RepoResult<ObjectKey> {
        let element = StructureElement::node(object_type, body)?;
        self.put_element(&element)
    }

    pub fn get(&self, key: &ObjectKey, lookup: Lookup) -> RepoResult<Option<StructureElement>> {
        self.index.get(key, lookup)
    }

    /// Share this repository's elements through the attached cache.
    pub fn publish_to_cache(&self) -> RepoResult<usize> {
        self.index.publish()
    }

    // ---- Root and status ----

    pub fn root(&self) -> Option<ObjectKey> {
        self.root
    }

    /// The root element. Fails if there is no root or it cannot be found
    /// under `lookup`.
    pub fn root_element(&self, lookup: Lookup) -> RepoResult<StructureElement> {
        let root = self
            .root
            .ok_or_else(|| RepoError::Commit("repository has no root".into()))?;
        self.index.get(&root, lookup)?.ok_or(RepoError::RootNotFound(root))
    }

    /// Point the working graph at `key`, which must be resolvable.
    pub fn set_root(&mut self, key: ObjectKey) -> RepoResult<()> {
        if !self.index.contains(&key, Lookup::Cached)? {
            return Err(RepoError::RootNotFound(key));
        }
        if self.root != Some(key) {
            debug!(root = %key.short_hex(), "root moved");
            self.root = Some(key);
            self.status = RepoStatus::Modified;
        }
        Ok(())
    }

    pub fn status(&self) -> RepoStatus {
        self.status
    }

    pub fn is_up_to_date(&self) -> bool {
        self.status == RepoStatus::UpToDate
    }

    // ---- Excluded types ----

    /// Types whose absence is tolerated when resolving links.
    pub fn excluded_types(&self) -> &BTreeSet<ObjectType> {
        &self.excluded_types
    }

    pub fn declare_excluded(&mut self, types: impl IntoIterator<Item = ObjectType>) {
        self.excluded_types.extend(types);
    }

    // ---- Links ----

    /// Resolve everything reachable from `root_key`, consulting the shared
    /// cache. Absent links are fatal unless their declared type is in
    /// `excluded`, in the repository's own excluded set, or declared excluded
    /// by the root node itself.
    pub fn load_links(&self, root_key: &ObjectKey, excluded: &BTreeSet<ObjectType>) -> RepoResult<TraversalResult> {
        self.reachable(root_key, Lookup::Cached, excluded)
    }

    /// Like [`load_links`](Self::load_links) but with an explicit lookup mode.
    pub fn reachable(
        &self,
        root_key: &ObjectKey,
        lookup: Lookup,
        excluded: &BTreeSet<ObjectType>,
    ) -> RepoResult<TraversalResult> {
        let root = self
            .index
            .get(root_key, lookup)?
            .ok_or(RepoError::RootNotFound(*root_key))?;
        let mut excluded: BTreeSet<ObjectType> = excluded.union(&self.excluded_types).copied().collect();
        if let Some(body) = root.body()? {
            excluded.extend(body.excluded_types);
        }
        Traversal::new(&self.index, lookup, &excluded).walk(&root)
    }

    // ---- History ----

    /// Record the current root. On an up-to-date repository this returns the
    /// head commit id and records nothing.
    pub fn commit(&mut self, comment: &str) -> RepoResult<ObjectKey> {
        self.commit_excluding(comment, &BTreeSet::new())
    }

    /// [`commit`](Self::commit), additionally tolerating absent links of the
    /// `excluded` types.
    pub fn commit_excluding(&mut self, comment: &str, excluded: &BTreeSet<ObjectType>) -> RepoResult<ObjectKey> {
        if let (RepoStatus::UpToDate, Some(head)) = (self.status, self.commits.head()) {
            return Ok(head.id);
        }
        let root = self
            .root
            .ok_or_else(|| RepoError::Commit("nothing to commit: repository has no root".into()))?;
        self.load_links(&root, excluded)?;

        let parent = self.commits.head().map(|c| c.id);
        let commit = Commit::new(root, parent, comment, Utc::now())?;
        let id = commit.id;
        self.commits.append(commit)?;
        self.status = RepoStatus::UpToDate;

        if let Some(mut current) = self.refs.head_branch()? {
            current.head = id;
            self.refs.write_branch(&current)?;
        }
        info!(commit = %id.short_hex(), root = %root.short_hex(), comment, "committed");
        Ok(id)
    }

    pub fn head_commit(&self) -> Option<&Commit> {
        self.commits.head()
    }

    pub fn commits(&self) -> &[Commit] {
        self.commits.as_slice()
    }

    // ---- Branches ----

    /// Create or repoint `name` at the head commit. The first branch created
    /// becomes the current one.
    pub fn branch(&mut self, name: &str) -> RepoResult<Branch> {
        let head = self
            .commits
            .head()
            .ok_or_else(|| RepoError::Branch(format!("cannot create {name:?}: no commits")))?;
        let branch = Branch::new(name, head.id);
        self.refs.write_branch(&branch)?;
        if self.refs.head()?.is_none() {
            self.refs.set_head(name)?;
        }
        Ok(branch)
    }

    pub fn branches(&self) -> RepoResult<Vec<Branch>> {
        Ok(self.refs.list_branches()?)
    }

    pub fn current_branch(&self) -> RepoResult<Option<String>> {
        Ok(self.refs.head()?)
    }

    // ---- Backing store ----

    /// Persist the elements under `keys`. Every key must be held.
    pub async fn push(&self, store: &dyn BackingStore, keys: &[ObjectKey]) -> RepoResult<PushAck> {
        let mut elements = Vec::with_capacity(keys.len());
        for key in keys {
            let element = self
                .index
                .get(key, Lookup::Cached)?
                .ok_or(cairn_store::StoreError::NotFound(*key))?;
            elements.push(element);
        }
        Ok(store.push(&elements).await?)
    }

    /// Persist the committed graph: the root and everything reachable.
    pub async fn push_all(&self, store: &dyn BackingStore) -> RepoResult<PushAck> {
        let root = self.root_element(Lookup::Cached)?;
        let reachable = self.load_links(&root.key, &BTreeSet::new())?;
        let mut elements = vec![root];
        elements.extend(reachable.reachable);
        Ok(store.push(&elements).await?)
    }

    /// Copy the elements under `keys` that `store` holds into the index.
    pub async fn pull(&mut self, store: &dyn BackingStore, keys: &[ObjectKey]) -> RepoResult<usize> {
        let elements = store.pull(keys).await?;
        for element in &elements {
            self.index.put(element)?;
        }
        Ok(elements.len())
    }

    /// Fetch missing link targets under the current root from `store` until
    /// a round adds nothing. Elements the store returns unasked are ignored.
    /// Returns how many elements were added.
    pub async fn hydrate(&mut self, store: &dyn BackingStore) -> RepoResult<usize> {
        let mut added = 0;
        loop {
            let root = self.root_element(Lookup::Cached)?;
            let mut excluded = self.excluded_types.clone();
            if let Some(body) = root.body()? {
                excluded.extend(body.excluded_types);
            }
            let missing = Traversal::new(&self.index, Lookup::Cached, &excluded).missing(&root)?;
            if missing.is_empty() {
                break;
            }
            let wanted: HashSet<ObjectKey> = missing.iter().map(|link| link.key).collect();
            let fetched = store.fetch_linked_objects(&missing).await?;

            let mut resolved = 0;
            for element in &fetched {
                if !wanted.contains(&element.key) {
                    debug!(key = %element.key.short_hex(), "ignoring unrequested element");
                    continue;
                }
                if !self.index.contains(&element.key, Lookup::Uncached)? {
                    self.index.put(element)?;
                    resolved += 1;
                }
            }
            if resolved == 0 {
                break;
            }
            added += resolved;
            debug!(resolved, still_missing = wanted.len().saturating_sub(resolved), "hydrated links");
        }
        Ok(added)
    }
}
