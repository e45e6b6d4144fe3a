use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Codec settings. Every field has a default, so a TOML file only needs the
/// keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Declared encoding the codec produces and accepts.
    pub encoding_tag: String,
    /// Values at least this long are zstd compressed. `0` disables it.
    pub compression_threshold: usize,
    pub compression_level: i32,
    /// Largest container, in bytes, that is produced or accepted.
    pub max_container_size: usize,
    /// Comment recorded when packing a repository with uncommitted changes.
    pub auto_commit_comment: String,
    /// Comment recorded on the commit made by unpack.
    pub received_comment: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            encoding_tag: "cairn-container-v1".into(),
            compression_threshold: 4096,
            compression_level: 3,
            max_container_size: 64 * 1024 * 1024,
            auto_commit_comment: "automatic commit before packing".into(),
            received_comment: "received".into(),
        }
    }
}

impl CodecConfig {
    pub fn from_toml_str(s: &str) -> CodecResult<Self> {
        toml::from_str(s).map_err(|e| CodecError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> CodecResult<String> {
        toml::to_string_pretty(self).map_err(|e| CodecError::Config(e.to_string()))
    }
}
