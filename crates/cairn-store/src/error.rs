use cairn_types::ObjectKey;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested element was not found.
    #[error("element not found: {0}")]
    NotFound(ObjectKey),

    /// Two distinct payloads were offered under the same key.
    #[error("hash collision: key {key} already holds different content")]
    HashCollision { key: ObjectKey },

    /// An element's key does not match the hash of its value.
    #[error("key mismatch: element claims {key}, value hashes to {computed}")]
    KeyMismatch { key: ObjectKey, computed: ObjectKey },

    /// Attempted to store an element with the null key.
    #[error("cannot store element with null key")]
    NullKey,

    /// A non-leaf element's body could not be decoded.
    #[error("corrupt node {key}: {reason}")]
    CorruptNode { key: ObjectKey, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backing store collaborator failed.
    #[error("backing store error: {0}")]
    Backing(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
