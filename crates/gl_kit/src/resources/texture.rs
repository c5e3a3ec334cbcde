//! Texture wrapper
//!
//! The backend contract has no texture operations yet, so this is a plain
//! named wrapper around an externally created texture id. It never owns the
//! backend object.
//! TODO: grow create/upload/bind operations once the backend contract gains
//! a texture surface.

use crate::backend::BackendId;
use crate::resources::{GpuHandle, Resource, ResourceKind};

/// A named, non-owning texture id.
pub struct Texture {
    handle: GpuHandle,
}

impl Texture {
    /// Wrap an externally managed texture id.
    pub fn wrap(id: BackendId) -> Self {
        Self {
            handle: GpuHandle::adopt(id, false),
        }
    }

    /// The wrapped backend id.
    pub fn id(&self) -> BackendId {
        self.handle.id()
    }

    /// Whether this wrapper holds the given backend id.
    pub fn wraps(&self, id: BackendId) -> bool {
        self.handle.id() == id
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Resource for Texture {
    const KIND: ResourceKind = ResourceKind::Texture;

    fn backend_id(&self) -> Option<BackendId> {
        self.handle.is_valid().then(|| self.handle.id())
    }

    fn disown(&mut self) {
        self.handle.disown();
    }
}
