//! Named branch pointers for Cairn repositories.
//!
//! A branch is a repointable name for a commit id. Repositories keep their
//! branches in a [`RefStore`]; the unpack path creates `master`.
//!
//! # Modules
//!
//! - [`error`] — Error types for ref operations
//! - [`types`] — [`Branch`] and the default branch name
//! - [`traits`] — The [`RefStore`] trait defining the storage interface
//! - [`names`] — Branch name validation
//! - [`memory`] — In-memory [`InMemoryRefStore`]

pub mod error;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use memory::InMemoryRefStore;
pub use names::validate_branch_name;
pub use traits::RefStore;
pub use types::{Branch, DEFAULT_BRANCH};
