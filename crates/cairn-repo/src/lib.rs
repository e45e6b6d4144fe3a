//! Object-graph repositories for Cairn.
//!
//! A [`Repository`] owns a working graph (a root key plus every element
//! reachable from it), an append-only commit log, named branches, and the set
//! of object types it tolerates being absent. It is the unit the container
//! codec packs from and unpacks into.
//!
//! Lookups take an explicit [`Lookup`] so that a caller can walk the graph
//! without consulting the process-wide
//! [`SharedObjectCache`](cairn_store::SharedObjectCache) and without touching
//! any shared flag.

pub mod commit;
pub mod error;
pub mod index;
pub mod repository;
pub mod resolver;
pub mod status;

pub use commit::{Commit, CommitLog};
pub use error::{RepoError, RepoResult};
pub use index::{ContentIndex, Lookup};
pub use repository::Repository;
pub use resolver::{LinkResolver, Traversal, TraversalResult};
pub use status::RepoStatus;
