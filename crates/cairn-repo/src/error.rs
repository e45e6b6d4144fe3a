use thiserror::Error;
use cairn_types::{ObjectKey, ObjectType};

#[derive(Debug, Error)]
pub enum RepoError {
    /// A linked key is absent and its declared type is not excluded.
    #[error("hashed reference {key} not found and not declared excluded (type {declared_type})")]
    DanglingReference {
        key: ObjectKey,
        declared_type: ObjectType,
    },

    #[error("root object not found: {0}")]
    RootNotFound(ObjectKey),

    #[error("commit failed: {0}")]
    Commit(String),

    #[error("branch failed: {0}")]
    Branch(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    Store(#[from] cairn_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] cairn_refs::RefError),
}

impl RepoError {
    pub fn is_dangling_reference(&self) -> bool {
        matches!(self, Self::DanglingReference { .. })
    }

    pub fn is_hash_collision(&self) -> bool {
        matches!(self, Self::Store(cairn_store::StoreError::HashCollision { .. }))
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
