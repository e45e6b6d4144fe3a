use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether the working root is recorded in the commit log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepoStatus {
    /// The working root is the root of the head commit.
    UpToDate,
    /// The working root changed (or was never committed).
    Modified,
}

impl fmt::Display for RepoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpToDate => write!(f, "up-to-date"),
            Self::Modified => write!(f, "modified"),
        }
    }
}
