use std::sync::Arc;

use crate::resource::{next_resource_id, ResourceId};

#[derive(Debug)]
struct TextureInner {
    id: ResourceId,
    name: String,
}

/// Handle to an externally owned texture resource.
#[derive(Debug, Clone)]
pub struct Texture {
    inner: Arc<TextureInner>,
}

#[derive(Debug)]
struct TextureViewInner {
    id: ResourceId,
    name: String,
    parent: Texture,
}

/// Handle to a view over a region of a [`Texture`]. The view keeps its parent
/// texture handle alive, which is what makes alias matching between a texture
/// and its views possible.
#[derive(Debug, Clone)]
pub struct TextureView {
    inner: Arc<TextureViewInner>,
}

impl Texture {
    /// Register a new texture identity under a debug name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TextureInner {
                id: next_resource_id(),
                name: name.into(),
            }),
        }
    }

    /// Create a view over this texture.
    pub fn view(&self, name: impl Into<String>) -> TextureView {
        TextureView {
            inner: Arc::new(TextureViewInner {
                id: next_resource_id(),
                name: name.into(),
                parent: self.clone(),
            }),
        }
    }

    /// Get the unique identity of this texture.
    pub fn id(&self) -> ResourceId {
        self.inner.id
    }

    /// Get the debug name of this texture.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Texture {}

impl TextureView {
    /// Get the unique identity of this view. Note that for dependency matching
    /// the view canonicalizes to its parent texture instead.
    pub fn id(&self) -> ResourceId {
        self.inner.id
    }

    /// Get the debug name of this view.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the texture this view was created over.
    pub fn parent(&self) -> &Texture {
        &self.inner.parent
    }
}

impl PartialEq for TextureView {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for TextureView {}
