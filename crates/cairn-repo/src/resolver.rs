//! Link resolution and breadth-first traversal of object graphs.

use std::collections::{BTreeSet, HashSet, VecDeque};

use cairn_store::{Link, StructureElement};
use cairn_types::{ObjectKey, ObjectType};
use tracing::debug;

use crate::error::{RepoError, RepoResult};
use crate::index::{ContentIndex, Lookup};

/// Reads outgoing links from elements.
pub struct LinkResolver;

impl LinkResolver {
    /// Outgoing links of an element, in declaration order. Leaves have none.
    pub fn child_links(element: &StructureElement) -> RepoResult<Vec<Link>> {
        Ok(element.body()?.map(|body| body.links).unwrap_or_default())
    }
}

/// Outcome of a traversal.
#[derive(Clone, Debug, Default)]
pub struct TraversalResult {
    /// Every reachable element except the start, in breadth-first discovery
    /// order, each exactly once.
    pub reachable: Vec<StructureElement>,
    /// Links that could not be resolved but whose declared type is excluded.
    pub skipped: Vec<Link>,
}

impl TraversalResult {
    pub fn keys(&self) -> impl Iterator<Item = ObjectKey> + '_ {
        self.reachable.iter().map(|e| e.key)
    }
}

/// Breadth-first walk over the links reachable from one element.
///
/// Each key is visited at most once, so shared children appear once and the
/// walk terminates even on malformed cyclic input. A link whose target is
/// absent is an error unless its declared type is in the excluded set.
/// Present targets are always followed, whatever their type.
pub struct Traversal<'a> {
    index: &'a ContentIndex,
    lookup: Lookup,
    excluded: &'a BTreeSet<ObjectType>,
}

impl<'a> Traversal<'a> {
    pub fn new(index: &'a ContentIndex, lookup: Lookup, excluded: &'a BTreeSet<ObjectType>) -> Self {
        Self {
            index,
            lookup,
            excluded,
        }
    }

    pub fn walk(&self, start: &StructureElement) -> RepoResult<TraversalResult> {
        let mut reachable = Vec::new();
        let mut skipped = Vec::new();
        self.visit(
            start,
            |link| {
                if !self.excluded.contains(&link.declared_type) {
                    return Err(RepoError::DanglingReference {
                        key: link.key,
                        declared_type: link.declared_type,
                    });
                }
                debug!(key = %link.key.short_hex(), object_type = %link.declared_type, "skipping excluded reference");
                skipped.push(*link);
                Ok(())
            },
            |element| reachable.push(element),
        )?;
        Ok(TraversalResult { reachable, skipped })
    }

    /// Absent, non-excluded link targets reachable from `start`.
    pub fn missing(&self, start: &StructureElement) -> RepoResult<Vec<Link>> {
        let mut missing = Vec::new();
        self.visit(
            start,
            |link| {
                if !self.excluded.contains(&link.declared_type) {
                    missing.push(*link);
                }
                Ok(())
            },
            |_| {},
        )?;
        Ok(missing)
    }

    fn visit(
        &self,
        start: &StructureElement,
        mut on_absent: impl FnMut(&Link) -> RepoResult<()>,
        mut on_found: impl FnMut(StructureElement),
    ) -> RepoResult<()> {
        let mut visited: HashSet<ObjectKey> = HashSet::from([start.key]);
        let mut frontier: VecDeque<Vec<Link>> = VecDeque::from([LinkResolver::child_links(start)?]);

        while let Some(links) = frontier.pop_front() {
            for link in links {
                if !visited.insert(link.key) {
                    continue;
                }
                match self.index.get(&link.key, self.lookup)? {
                    Some(element) => {
                        frontier.push_back(LinkResolver::child_links(&element)?);
                        on_found(element);
                    }
                    None => on_absent(&link)?,
                }
            }
        }
        Ok(())
    }
}
