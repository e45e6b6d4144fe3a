use std::collections::BTreeSet;

use cairn_repo::{Lookup, Repository};
use cairn_types::ObjectType;
use tracing::{debug, info};

use crate::config::CodecConfig;
use crate::container::Container;
use crate::error::CodecResult;

/// Collect a repository's root and everything it reaches into a container.
///
/// Uncommitted changes are committed first. The walk reads only the
/// repository's own elements, never the shared cache, so the container holds
/// exactly what this repository can vouch for. Absent links are tolerated
/// only for types in `excluded`, in the repository's excluded set, or
/// declared excluded by the root.
pub fn pack(repo: &mut Repository, excluded: &BTreeSet<ObjectType>, config: &CodecConfig) -> CodecResult<Container> {
    if !repo.is_up_to_date() {
        let id = repo.commit_excluding(&config.auto_commit_comment, excluded)?;
        debug!(commit = %id.short_hex(), "committed before packing");
    }

    let head = repo.root_element(Lookup::Uncached)?;
    let walk = repo.reachable(&head.key, Lookup::Uncached, excluded)?;
    let skipped = walk.skipped.len();
    let container = Container::new(head, walk.reachable)?;

    info!(
        head = %container.head().key.short_hex(),
        elements = container.len(),
        skipped,
        "packed container"
    );
    Ok(container)
}
