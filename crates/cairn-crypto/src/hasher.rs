use cairn_types::ObjectKey;

/// BLAKE3 hasher bound to a key-derivation context.
///
/// Each domain uses BLAKE3's `derive_key` mode with its own context string,
/// so an element value, a commit record and a container body with identical
/// bytes hash to unrelated keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    context: &'static str,
}

impl ContentHasher {
    /// Structure element values. Element keys are computed with this.
    pub const ELEMENT: Self = Self::new("cairn 2024 structure element v1");
    /// Commit records.
    pub const COMMIT: Self = Self::new("cairn 2024 commit record v1");
    /// Container bodies (the wire trailer).
    pub const CONTAINER: Self = Self::new("cairn 2024 container body v1");

    const fn new(context: &'static str) -> Self {
        Self { context }
    }

    pub fn hash(&self, data: &[u8]) -> ObjectKey {
        self.hash_parts(&[data])
    }

    /// Hash the concatenation of `parts` without joining them first.
    pub fn hash_parts(&self, parts: &[&[u8]]) -> ObjectKey {
        let mut hasher = blake3::Hasher::new_derive_key(self.context);
        for part in parts {
            hasher.update(part);
        }
        ObjectKey::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash the JSON encoding of `value`.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<ObjectKey, HasherError> {
        let data = serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
