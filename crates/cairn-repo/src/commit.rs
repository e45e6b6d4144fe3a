use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use cairn_crypto::ContentHasher;
use cairn_types::ObjectKey;

use crate::error::{RepoError, RepoResult};

/// A recorded snapshot of a repository's root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit-domain hash of the other fields.
    pub id: ObjectKey,
    pub root: ObjectKey,
    pub parent: Option<ObjectKey>,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct CommitRecord<'a> {
    root: &'a ObjectKey,
    parent: &'a Option<ObjectKey>,
    comment: &'a str,
    timestamp: &'a DateTime<Utc>,
}

impl Commit {
    pub fn new(
        root: ObjectKey,
        parent: Option<ObjectKey>,
        comment: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> RepoResult<Self> {
        let comment = comment.into();
        let id = ContentHasher::COMMIT
            .hash_json(&CommitRecord {
                root: &root,
                parent: &parent,
                comment: &comment,
                timestamp: &timestamp,
            })
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        Ok(Self {
            id,
            root,
            parent,
            comment,
            timestamp,
        })
    }
}

/// Append-only commit history, oldest first.
#[derive(Clone, Debug, Default)]
pub struct CommitLog {
    commits: Vec<Commit>,
}

impl CommitLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit. Its parent must be the current head.
    pub fn append(&mut self, commit: Commit) -> RepoResult<()> {
        let head = self.head().map(|c| c.id);
        if commit.parent != head {
            return Err(RepoError::Commit(format!(
                "parent {:?} is not the current head {:?}",
                commit.parent, head
            )));
        }
        self.commits.push(commit);
        Ok(())
    }

    pub fn head(&self) -> Option<&Commit> {
        self.commits.last()
    }

    pub fn get(&self, id: &ObjectKey) -> Option<&Commit> {
        self.commits.iter().find(|c| c.id == *id)
    }

    pub fn as_slice(&self) -> &[Commit] {
        &self.commits
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(tag: &[u8]) -> ObjectKey {
        ObjectKey::digest(tag)
    }

    #[test]
    fn id_depends_on_every_field() {
        let ts = Utc::now();
        let base = Commit::new(root(b"r"), None, "c", ts).unwrap();
        assert_eq!(base.id, Commit::new(root(b"r"), None, "c", ts).unwrap().id);
        assert_ne!(base.id, Commit::new(root(b"s"), None, "c", ts).unwrap().id);
        assert_ne!(base.id, Commit::new(root(b"r"), Some(base.id), "c", ts).unwrap().id);
        assert_ne!(base.id, Commit::new(root(b"r"), None, "d", ts).unwrap().id);
    }

    #[test]
    fn commit_id_differs_from_root_key() {
        let c = Commit::new(root(b"r"), None, "c", Utc::now()).unwrap();
        assert_ne!(c.id, c.root);
    }

    #[test]
    fn log_chains_parents() {
        let mut log = CommitLog::new();
        let first = Commit::new(root(b"1"), None, "first", Utc::now()).unwrap();
        log.append(first.clone()).unwrap();
        let second = Commit::new(root(b"2"), Some(first.id), "second", Utc::now()).unwrap();
        log.append(second.clone()).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log.head(), Some(&second));
        assert_eq!(log.get(&first.id), Some(&first));
    }

    #[test]
    fn log_rejects_wrong_parent() {
        let mut log = CommitLog::new();
        log.append(Commit::new(root(b"1"), None, "first", Utc::now()).unwrap()).unwrap();
        let orphan = Commit::new(root(b"2"), None, "orphan", Utc::now()).unwrap();
        assert!(matches!(log.append(orphan), Err(RepoError::Commit(_))));
        assert_eq!(log.len(), 1);
    }
}
