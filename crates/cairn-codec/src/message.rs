//! Views over an unpacked graph, chosen by the type of its root.

use cairn_repo::{Lookup, Repository};
use cairn_store::{Link, NodeBody, StructureElement};
use cairn_types::{ObjectKey, ObjectType};

use crate::error::CodecResult;

/// Object type of a message envelope node.
pub const MESSAGE_ENVELOPE_TYPE: ObjectType = ObjectType::new(11, 1);

/// An unpacked repository together with its root element.
#[derive(Debug)]
pub struct RootObject {
    repository: Repository,
    element: StructureElement,
}

impl RootObject {
    pub(crate) fn new(repository: Repository, element: StructureElement) -> Self {
        Self { repository, element }
    }

    pub fn key(&self) -> ObjectKey {
        self.element.key
    }

    pub fn object_type(&self) -> ObjectType {
        self.element.object_type
    }

    pub fn element(&self) -> &StructureElement {
        &self.element
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Packing may auto-commit, which never moves the root.
    pub(crate) fn repository_mut(&mut self) -> &mut Repository {
        &mut self.repository
    }

    pub fn into_repository(self) -> Repository {
        self.repository
    }
}

/// A message envelope root: the wrapped object is its first link, and the
/// envelope carries optional data and the types the sender left out.
#[derive(Debug)]
pub struct MessageView {
    root: RootObject,
    body: NodeBody,
}

impl MessageView {
    pub fn root(&self) -> &RootObject {
        &self.root
    }

    pub fn repository(&self) -> &Repository {
        self.root.repository()
    }

    pub fn into_root(self) -> RootObject {
        self.root
    }

    /// Link to the wrapped object.
    pub fn message_link(&self) -> Option<&Link> {
        self.body.links.first()
    }

    pub fn message_type(&self) -> Option<ObjectType> {
        self.message_link().map(|l| l.declared_type)
    }

    /// The wrapped object, or `None` if the envelope is empty or the object
    /// was left out as an excluded type.
    pub fn message_object(&self) -> CodecResult<Option<StructureElement>> {
        match self.message_link() {
            Some(link) => Ok(self.repository().get(&link.key, Lookup::Cached)?),
            None => Ok(None),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.body.data
    }

    pub fn excluded_types(&self) -> &[ObjectType] {
        &self.body.excluded_types
    }
}

/// Result of unpacking: the generic root view, or the message view when the
/// root is a message envelope.
#[derive(Debug)]
pub enum Decoded {
    Root(RootObject),
    Message(MessageView),
}

impl Decoded {
    /// Pick the view for `root`. Only envelope-typed nodes get a message view.
    pub fn dispatch(root: RootObject) -> CodecResult<Self> {
        if root.object_type() != MESSAGE_ENVELOPE_TYPE {
            return Ok(Self::Root(root));
        }
        let body = root.element().body()?;
        match body {
            Some(body) => Ok(Self::Message(MessageView { root, body })),
            None => Ok(Self::Root(root)),
        }
    }

    pub fn root(&self) -> &RootObject {
        match self {
            Self::Root(root) => root,
            Self::Message(view) => &view.root,
        }
    }

    pub(crate) fn root_mut(&mut self) -> &mut RootObject {
        match self {
            Self::Root(root) => root,
            Self::Message(view) => &mut view.root,
        }
    }

    pub fn repository(&self) -> &Repository {
        self.root().repository()
    }

    pub fn is_message(&self) -> bool {
        matches!(self, Self::Message(_))
    }

    pub fn as_message(&self) -> Option<&MessageView> {
        match self {
            Self::Message(view) => Some(view),
            Self::Root(_) => None,
        }
    }

    pub fn into_repository(self) -> Repository {
        match self {
            Self::Root(root) => root.into_repository(),
            Self::Message(view) => view.into_root().into_repository(),
        }
    }
}

/// Builder for a message envelope node.
#[derive(Clone, Debug)]
pub struct MessageEnvelope {
    body: NodeBody,
}

impl MessageEnvelope {
    /// An envelope wrapping `message`.
    pub fn new(message: Link) -> Self {
        Self {
            body: NodeBody::new().with_link(message),
        }
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.body = self.body.with_data(data);
        self
    }

    /// Declare a type the receiver should not expect to find.
    pub fn with_excluded(mut self, object_type: ObjectType) -> Self {
        self.body = self.body.with_excluded(object_type);
        self
    }

    /// Store the envelope in `repo` and make it the root.
    pub fn write(self, repo: &mut Repository) -> CodecResult<ObjectKey> {
        let key = repo.write_node(MESSAGE_ENVELOPE_TYPE, &self.body)?;
        repo.set_root(key)?;
        Ok(key)
    }
}
