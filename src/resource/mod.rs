//! External resource identity.
//!
//! The present-task graph never owns the GPU resources a task reads or writes;
//! true ownership lives in the surrounding resource context. Tasks only record
//! *which* object an IO slot refers to, so the wiring engine can match a
//! producer's output against a consumer's input. The handles in this module
//! carry exactly that: a unique identity, a debug name, and (for texture
//! views) the parent texture needed for alias matching.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod pool;

mod buffer;
mod texture;

pub use buffer::Buffer;
pub use texture::{Texture, TextureView};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_resource_id() -> ResourceId {
    ResourceId(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Unique identity of an external resource. Ids are process-wide unique across
/// all object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Get the raw id value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Type of an object declared in a task IO slot.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum ObjectType {
    /// Buffer resource
    Buffer,
    /// Texture resource
    Texture,
    /// View over a region of a texture
    TextureView,
}

/// An object declared as task input or output.
///
/// Two IO resources denote the *same dependency* if their canonical ids match:
/// a texture view canonicalizes to its parent texture, so a task writing a
/// texture and a task reading a view of that texture are wired together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoResource {
    /// A buffer.
    Buffer(Buffer),
    /// A whole texture.
    Texture(Texture),
    /// A view over a texture.
    TextureView(TextureView),
}

impl IoResource {
    /// Get the object type of this resource.
    pub fn object_type(&self) -> ObjectType {
        match self {
            IoResource::Buffer(_) => ObjectType::Buffer,
            IoResource::Texture(_) => ObjectType::Texture,
            IoResource::TextureView(_) => ObjectType::TextureView,
        }
    }

    /// Get the identity of the declared object itself.
    pub fn id(&self) -> ResourceId {
        match self {
            IoResource::Buffer(buffer) => buffer.id(),
            IoResource::Texture(texture) => texture.id(),
            IoResource::TextureView(view) => view.id(),
        }
    }

    /// Get the identity this resource canonicalizes to for dependency
    /// matching. A texture view collapses to its parent texture, everything
    /// else is its own canonical object.
    pub fn canonical_id(&self) -> ResourceId {
        match self {
            IoResource::TextureView(view) => view.parent().id(),
            _ => self.id(),
        }
    }

    /// Get the debug name of the declared object.
    pub fn name(&self) -> &str {
        match self {
            IoResource::Buffer(buffer) => buffer.name(),
            IoResource::Texture(texture) => texture.name(),
            IoResource::TextureView(view) => view.name(),
        }
    }

    /// Whether two IO resources denote the same dependency.
    ///
    /// Identical objects match, and a [`Texture`] matches any [`TextureView`]
    /// whose parent texture equals it (and two views match if their parents
    /// are the same texture). Buffers only ever match themselves.
    pub fn aliases(&self, other: &IoResource) -> bool {
        self.canonical_id() == other.canonical_id()
    }
}

impl From<&Buffer> for IoResource {
    fn from(buffer: &Buffer) -> Self {
        IoResource::Buffer(buffer.clone())
    }
}

impl From<&Texture> for IoResource {
    fn from(texture: &Texture) -> Self {
        IoResource::Texture(texture.clone())
    }
}

impl From<&TextureView> for IoResource {
    fn from(view: &TextureView) -> Self {
        IoResource::TextureView(view.clone())
    }
}
