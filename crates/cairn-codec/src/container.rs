use std::collections::HashSet;

use cairn_store::StructureElement;
use cairn_types::ObjectKey;

use crate::config::CodecConfig;
use crate::error::{decode_err, CodecError, CodecResult};
use crate::wire;

/// A self-contained graph snapshot: the head element plus every element it
/// needs, each key at most once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    head: StructureElement,
    items: Vec<StructureElement>,
}

impl Container {
    pub fn new(head: StructureElement, items: Vec<StructureElement>) -> CodecResult<Self> {
        let mut seen = HashSet::from([head.key]);
        if let Some(dup) = items.iter().find(|e| !seen.insert(e.key)) {
            return Err(decode_err(format!("duplicate key {}", dup.key)));
        }
        Ok(Self { head, items })
    }

    /// Build from a flat list whose first element is the head.
    pub fn from_elements(elements: Vec<StructureElement>) -> CodecResult<Self> {
        let mut elements = elements.into_iter();
        let head = elements.next().ok_or(CodecError::EmptyContainer)?;
        Self::new(head, elements.collect())
    }

    pub fn from_bytes(data: &[u8], config: &CodecConfig) -> CodecResult<Self> {
        Self::from_elements(wire::decode(data, config)?)
    }

    pub fn to_bytes(&self, config: &CodecConfig) -> CodecResult<Vec<u8>> {
        wire::encode(self.iter(), config)
    }

    pub fn head(&self) -> &StructureElement {
        &self.head
    }

    pub fn items(&self) -> &[StructureElement] {
        &self.items
    }

    /// Head first, then items in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &StructureElement> {
        std::iter::once(&self.head).chain(self.items.iter())
    }

    pub fn keys(&self) -> Vec<ObjectKey> {
        self.iter().map(|e| e.key).collect()
    }

    /// Number of elements including the head.
    pub fn len(&self) -> usize {
        self.items.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn into_parts(self) -> (StructureElement, Vec<StructureElement>) {
        (self.head, self.items)
    }
}
