use std::sync::Arc;

use crate::resource::{next_resource_id, ResourceId};

#[derive(Debug)]
struct BufferInner {
    id: ResourceId,
    name: String,
}

/// Handle to an externally owned buffer resource. Cloning the handle does not
/// duplicate the buffer, it only shares the identity record.
#[derive(Debug, Clone)]
pub struct Buffer {
    inner: Arc<BufferInner>,
}

impl Buffer {
    /// Register a new buffer identity under a debug name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(BufferInner {
                id: next_resource_id(),
                name: name.into(),
            }),
        }
    }

    /// Get the unique identity of this buffer.
    pub fn id(&self) -> ResourceId {
        self.inner.id
    }

    /// Get the debug name of this buffer.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Buffer {}
