//! Content-addressed element storage for Cairn.
//!
//! This crate implements the hash-keyed object store that backs every
//! repository. The unit of storage is the [`StructureElement`]: a typed,
//! immutable byte payload identified by the BLAKE3 hash of its value.
//! Non-leaf elements carry a [`NodeBody`] whose [`Link`]s reference other
//! elements by key, which is how object graphs are formed.
//!
//! # Storage Layers
//!
//! All stores implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] -- the per-repository content index
//! - [`SharedObjectCache`] -- a process-wide cache shared between repositories
//!
//! Durable stores live behind the async [`BackingStore`] seam;
//! [`InMemoryBackingStore`] implements it for tests and embedding.
//!
//! # Design Rules
//!
//! 1. Elements are immutable once constructed; changes produce new keys.
//! 2. `put` verifies the key against the value before storing.
//! 3. `put` is idempotent for identical content. The same key with different
//!    content is a [`StoreError::HashCollision`] and is never resolved silently.
//! 4. Absence is explicit: a missing key reads as `Ok(None)`.
//! 5. Stores never evict.

pub mod backing;
pub mod cache;
pub mod element;
pub mod error;
pub mod memory;
pub mod traits;

pub use backing::{BackingStore, InMemoryBackingStore, PushAck};
pub use cache::{CacheStats, SharedObjectCache};
pub use element::{Link, NodeBody, StructureElement};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryContentStore;
pub use traits::ContentStore;
