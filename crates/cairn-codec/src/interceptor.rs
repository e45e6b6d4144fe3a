use std::sync::Arc;

use async_trait::async_trait;
use cairn_store::BackingStore;
use tracing::debug;

use crate::codec::ObjectCodec;
use crate::error::CodecResult;
use crate::message::Decoded;

/// Payload of a pipeline message.
#[derive(Debug)]
pub enum Content {
    /// Undecoded bytes.
    Raw(Vec<u8>),
    /// An object graph.
    Object(Box<Decoded>),
    /// Anything this codec does not handle.
    Other(serde_json::Value),
}

/// A message passing through the pipeline with its declared encoding.
#[derive(Debug)]
pub struct Envelope {
    pub encoding: Option<String>,
    pub content: Content,
}

impl Envelope {
    pub fn new(encoding: Option<String>, content: Content) -> Self {
        Self { encoding, content }
    }
}

/// A pipeline stage that may rewrite messages on the way in and out.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Inbound: runs before the message reaches the application.
    async fn before(&self, envelope: Envelope) -> CodecResult<Envelope>;
    /// Outbound: runs before the message reaches the transport.
    async fn after(&self, envelope: Envelope) -> CodecResult<Envelope>;
}

/// Leaves every message untouched.
pub struct PassThrough;

#[async_trait]
impl Interceptor for PassThrough {
    async fn before(&self, envelope: Envelope) -> CodecResult<Envelope> {
        Ok(envelope)
    }

    async fn after(&self, envelope: Envelope) -> CodecResult<Envelope> {
        Ok(envelope)
    }
}

/// Decodes inbound containers carrying our encoding tag and packs outbound
/// object graphs.
pub struct ObjectCodecInterceptor {
    codec: ObjectCodec,
    backing: Option<Arc<dyn BackingStore>>,
}

impl ObjectCodecInterceptor {
    pub fn new(codec: ObjectCodec) -> Self {
        Self { codec, backing: None }
    }

    /// Resolve references missing from inbound containers through `backing`.
    pub fn with_backing(mut self, backing: Arc<dyn BackingStore>) -> Self {
        self.backing = Some(backing);
        self
    }
}

#[async_trait]
impl Interceptor for ObjectCodecInterceptor {
    async fn before(&self, envelope: Envelope) -> CodecResult<Envelope> {
        if envelope.encoding.as_deref() != Some(self.codec.encoding_tag()) {
            return Ok(envelope);
        }
        let bytes = match envelope.content {
            Content::Raw(bytes) => bytes,
            content => return Ok(Envelope::new(envelope.encoding, content)),
        };
        let decoded = match &self.backing {
            Some(backing) => self.codec.unpack_with_backing(&bytes, backing.as_ref()).await?,
            None => self.codec.unpack(&bytes)?,
        };
        debug!(root = %decoded.root().key().short_hex(), message = decoded.is_message(), "decoded inbound container");
        Ok(Envelope::new(envelope.encoding, Content::Object(Box::new(decoded))))
    }

    async fn after(&self, envelope: Envelope) -> CodecResult<Envelope> {
        match envelope.content {
            Content::Object(mut decoded) => {
                let (bytes, tag) = self.codec.encode(&mut decoded)?;
                debug!(bytes = bytes.len(), "encoded outbound object");
                Ok(Envelope::new(Some(tag), Content::Raw(bytes)))
            }
            content => Ok(Envelope::new(envelope.encoding, content)),
        }
    }
}
