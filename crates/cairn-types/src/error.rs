use thiserror::Error;

/// Errors from parsing keys and object types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("key is not valid hex: {0}")]
    InvalidHex(String),

    #[error("key must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("malformed object type {0:?}, expected <object_id>v<version>")]
    InvalidObjectType(String),
}
