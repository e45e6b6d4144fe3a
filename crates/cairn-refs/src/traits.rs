//! The [`RefStore`] trait defining the branch storage interface.

use crate::error::Result;
use crate::types::Branch;

/// Storage backend for named branches and the current-branch pointer.
///
/// Implementations must be thread-safe and validate branch names on write.
pub trait RefStore: Send + Sync {
    /// Read a branch by short name. `Ok(None)` if it does not exist.
    fn read_branch(&self, name: &str) -> Result<Option<Branch>>;

    /// Create or repoint a branch.
    fn write_branch(&self, branch: &Branch) -> Result<()>;

    /// All branches, sorted by name.
    fn list_branches(&self) -> Result<Vec<Branch>>;

    /// Name of the branch new commits advance, if one is set.
    fn head(&self) -> Result<Option<String>>;

    /// Make `branch` the current branch. It must already exist.
    fn set_head(&self, branch: &str) -> Result<()>;

    /// The branch HEAD names, read through to its commit.
    fn head_branch(&self) -> Result<Option<Branch>> {
        match self.head()? {
            Some(name) => self.read_branch(&name),
            None => Ok(None),
        }
    }
}
