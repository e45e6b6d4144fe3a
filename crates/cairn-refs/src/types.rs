//! Core reference types.

use serde::{Deserialize, Serialize};
use cairn_types::ObjectKey;

/// The branch a freshly unpacked repository is checked out on.
pub const DEFAULT_BRANCH: &str = "master";

/// A named, repointable pointer to a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Short branch name (e.g. "master", "feature/auth").
    pub name: String,
    /// Id of the commit this branch points at.
    pub head: ObjectKey,
}

impl Branch {
    pub fn new(name: impl Into<String>, head: ObjectKey) -> Self {
        Self {
            name: name.into(),
            head,
        }
    }

    /// Canonical ref path, e.g. `refs/heads/master`.
    pub fn canonical_name(&self) -> String {
        format!("refs/heads/{}", self.name)
    }
}
