use thiserror::Error;
use cairn_repo::RepoError;
use cairn_store::StoreError;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Bytes are not a well-formed container.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("container holds no elements")]
    EmptyContainer,

    #[error("{size} bytes exceeds the container limit of {max}")]
    TooLarge { size: usize, max: usize },

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepoError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl CodecError {
    pub fn is_dangling_reference(&self) -> bool {
        matches!(self, Self::Repository(e) if e.is_dangling_reference())
    }

    pub fn is_hash_collision(&self) -> bool {
        match self {
            Self::Store(StoreError::HashCollision { .. }) => true,
            Self::Repository(e) => e.is_hash_collision(),
            _ => false,
        }
    }
}

pub(crate) fn decode_err(reason: impl Into<String>) -> CodecError {
    CodecError::Decode(reason.into())
}

pub type CodecResult<T> = Result<T, CodecError>;
