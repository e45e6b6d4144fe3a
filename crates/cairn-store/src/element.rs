use serde::{Deserialize, Serialize};
use cairn_crypto::ContentHasher;
use cairn_types::{ObjectKey, ObjectType};

use crate::error::{StoreError, StoreResult};

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

/// A typed reference from a parent element to a child element.
///
/// The declared type lets a receiver decide whether an absent target is an
/// intentional omission (its type is excluded) or data loss.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub key: ObjectKey,
    pub declared_type: ObjectType,
}

impl Link {
    pub fn new(key: ObjectKey, declared_type: ObjectType) -> Self {
        Self { key, declared_type }
    }

    /// A link pointing at an existing element, declaring its own type.
    pub fn to(element: &StructureElement) -> Self {
        Self {
            key: element.key,
            declared_type: element.object_type,
        }
    }
}

// ---------------------------------------------------------------------------
// NodeBody
// ---------------------------------------------------------------------------

/// Decoded payload of a non-leaf element.
///
/// The body is bincode-encoded into the element's value, so links take part
/// in the element's key: changing a child changes every ancestor's key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBody {
    /// Outgoing links, in declaration order.
    pub links: Vec<Link>,
    /// Opaque node-specific fields.
    pub data: Vec<u8>,
    /// Types the producer of this node intentionally leaves out of transfers.
    pub excluded_types: Vec<ObjectType>,
}

impl NodeBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn with_excluded(mut self, object_type: ObjectType) -> Self {
        if !self.excluded_types.contains(&object_type) {
            self.excluded_types.push(object_type);
        }
        self
    }

    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> StoreResult<Self> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// StructureElement
// ---------------------------------------------------------------------------

/// The atomic unit of storage and transfer: a keyed, typed, immutable payload.
///
/// Leaves carry opaque bytes. Nodes carry an encoded [`NodeBody`]. The key
/// covers the type and the leaf flag as well as the value, so equal keys mean
/// interchangeable elements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureElement {
    pub key: ObjectKey,
    pub object_type: ObjectType,
    pub is_leaf: bool,
    pub value: Vec<u8>,
}

impl StructureElement {
    /// Key of an element with the given parts.
    ///
    /// Preimage: `object_id` and `version` as u32 BE, one leaf-flag byte, then
    /// the value.
    pub fn key_for(object_type: ObjectType, is_leaf: bool, value: &[u8]) -> ObjectKey {
        let object_id = object_type.object_id.to_be_bytes();
        let version = object_type.version.to_be_bytes();
        let flag = [u8::from(is_leaf)];
        ContentHasher::ELEMENT.hash_parts(&[&object_id[..], &version[..], &flag[..], value])
    }

    /// Create a leaf element, computing its key.
    pub fn leaf(object_type: ObjectType, value: impl Into<Vec<u8>>) -> Self {
        let value = value.into();
        Self {
            key: Self::key_for(object_type, true, &value),
            object_type,
            is_leaf: true,
            value,
        }
    }

    /// Create a node element from a body, computing its key.
    pub fn node(object_type: ObjectType, body: &NodeBody) -> StoreResult<Self> {
        let value = body.encode()?;
        Ok(Self {
            key: Self::key_for(object_type, false, &value),
            object_type,
            is_leaf: false,
            value,
        })
    }

    /// Assemble an element from received parts without recomputing the key.
    ///
    /// Use [`verify`](Self::verify) or a [`ContentStore`](crate::ContentStore)
    /// write to check it.
    pub fn from_parts(key: ObjectKey, object_type: ObjectType, is_leaf: bool, value: Vec<u8>) -> Self {
        Self {
            key,
            object_type,
            is_leaf,
            value,
        }
    }

    /// The key this element's type, leaf flag and value hash to.
    pub fn compute_key(&self) -> ObjectKey {
        Self::key_for(self.object_type, self.is_leaf, &self.value)
    }

    /// Check that the stored key matches the content.
    pub fn verify(&self) -> StoreResult<()> {
        let computed = self.compute_key();
        if computed != self.key {
            return Err(StoreError::KeyMismatch {
                key: self.key,
                computed,
            });
        }
        Ok(())
    }

    /// `true` when both elements carry byte-identical content.
    pub fn same_content(&self, other: &Self) -> bool {
        self.object_type == other.object_type
            && self.is_leaf == other.is_leaf
            && self.value == other.value
    }

    /// Decode the node body. Leaves have none.
    pub fn body(&self) -> StoreResult<Option<NodeBody>> {
        if self.is_leaf {
            return Ok(None);
        }
        NodeBody::decode(&self.value)
            .map(Some)
            .map_err(|e| StoreError::CorruptNode {
                key: self.key,
                reason: e.to_string(),
            })
    }

    /// Size of the value in bytes.
    pub fn size(&self) -> usize {
        self.value.len()
    }
}
