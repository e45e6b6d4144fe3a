use std::collections::BTreeSet;
use std::sync::Arc;

use cairn_repo::Repository;
use cairn_store::{BackingStore, SharedObjectCache};
use cairn_types::ObjectType;
use tracing::trace;

use crate::config::CodecConfig;
use crate::container::Container;
use crate::error::CodecResult;
use crate::message::Decoded;
use crate::{pack, unpack};

/// Packs repositories into container bytes and unpacks them again.
///
/// Cheap to clone; clones share the optional object cache.
#[derive(Clone, Debug, Default)]
pub struct ObjectCodec {
    config: CodecConfig,
    cache: Option<Arc<SharedObjectCache>>,
}

impl ObjectCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config, cache: None }
    }

    /// Unpacked repositories resolve links through `cache` as well as the
    /// container itself.
    pub fn with_cache(mut self, cache: Arc<SharedObjectCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn encoding_tag(&self) -> &str {
        &self.config.encoding_tag
    }

    pub fn pack(&self, repo: &mut Repository, excluded: &BTreeSet<ObjectType>) -> CodecResult<Vec<u8>> {
        pack::pack(repo, excluded, &self.config)?.to_bytes(&self.config)
    }

    pub fn unpack(&self, data: &[u8]) -> CodecResult<Decoded> {
        let container = Container::from_bytes(data, &self.config)?;
        unpack::unpack(container, &self.config, self.cache.clone())
    }

    pub async fn unpack_with_backing(&self, data: &[u8], backing: &dyn BackingStore) -> CodecResult<Decoded> {
        let container = Container::from_bytes(data, &self.config)?;
        unpack::unpack_with_backing(container, &self.config, self.cache.clone(), backing).await
    }

    /// Pack an unpacked (or freshly built) object, returning the bytes and
    /// the encoding tag to declare alongside them.
    pub fn encode(&self, decoded: &mut Decoded) -> CodecResult<(Vec<u8>, String)> {
        self.encode_repository(decoded.root_mut().repository_mut())
    }

    pub fn encode_repository(&self, repo: &mut Repository) -> CodecResult<(Vec<u8>, String)> {
        let bytes = self.pack(repo, &BTreeSet::new())?;
        Ok((bytes, self.config.encoding_tag.clone()))
    }

    /// Unpack `data` if its declared encoding is ours; `Ok(None)` otherwise.
    pub fn decode(&self, data: &[u8], declared_encoding: Option<&str>) -> CodecResult<Option<Decoded>> {
        if declared_encoding != Some(self.encoding_tag()) {
            trace!(?declared_encoding, "encoding not handled by object codec");
            return Ok(None);
        }
        self.unpack(data).map(Some)
    }
}
