//! Vertex array object wrapper

use crate::backend::{BackendId, BufferTarget};
use crate::context::Context;
use crate::resources::{GpuHandle, Resource, ResourceKind};

/// A vertex array object, owning or non-owning.
pub struct VertexArray {
    pub(crate) ctx: Context,
    handle: GpuHandle,
}

impl VertexArray {
    /// Allocate a new vertex array.
    pub fn new(ctx: &Context) -> Self {
        let id = ctx.backend_mut().create_vertex_array();
        log::debug!("generated vertex array object {id}");
        Self {
            ctx: ctx.clone(),
            handle: GpuHandle::acquire(id),
        }
    }

    /// Wrap an existing vertex array with explicit ownership. Passing id 0
    /// allocates a fresh, owned vertex array instead.
    pub fn from_raw(ctx: &Context, id: BackendId, owns: bool) -> Self {
        if id == 0 {
            return Self::new(ctx);
        }
        Self {
            ctx: ctx.clone(),
            handle: GpuHandle::adopt(id, owns),
        }
    }

    /// The wrapped backend id (0 when released).
    pub fn id(&self) -> BackendId {
        self.handle.id()
    }

    /// Whether this wrapper holds the given backend id.
    pub fn wraps(&self, id: BackendId) -> bool {
        self.handle.id() == id
    }

    /// Run `setup` with this vertex array bound, then unbind it together
    /// with both buffer targets. The element buffer is unbound only after
    /// the vertex array, so the association recorded in the VAO survives.
    pub fn with_bound<R>(&self, setup: impl FnOnce() -> R) -> R {
        self.ctx.backend_mut().bind_vertex_array(self.handle.id());

        let result = setup();

        let mut backend = self.ctx.backend_mut();
        backend.bind_vertex_array(0);
        backend.bind_buffer(BufferTarget::Vertex, 0);
        backend.bind_buffer(BufferTarget::Index, 0);
        result
    }

    /// Release the backend vertex array if owned and invalidate the handle.
    /// Safe to call more than once.
    pub fn clear(&mut self) {
        if self.handle.owns() && self.handle.is_valid() {
            log::debug!("deleting vertex array object {}", self.handle.id());
            self.ctx.backend_mut().delete_vertex_array(self.handle.id());
        }
        self.handle.reset();
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.clear();
    }
}

impl PartialEq for VertexArray {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Resource for VertexArray {
    const KIND: ResourceKind = ResourceKind::VertexArray;

    fn backend_id(&self) -> Option<BackendId> {
        self.handle.is_valid().then(|| self.handle.id())
    }

    fn disown(&mut self) {
        self.handle.disown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    fn headless_ctx() -> Context {
        Context::new(Box::new(HeadlessBackend::new()))
    }

    #[test]
    fn test_with_bound_unbinds_everything() {
        let ctx = headless_ctx();
        let array = VertexArray::new(&ctx);
        let seen = array.with_bound(|| {
            ctx.backend_mut()
                .as_any()
                .downcast_ref::<HeadlessBackend>()
                .expect("headless backend")
                .bound_vertex_array()
        });
        assert_eq!(seen, array.id());

        let backend = ctx.backend_mut();
        let headless = backend
            .as_any()
            .downcast_ref::<HeadlessBackend>()
            .expect("headless backend");
        assert_eq!(headless.bound_vertex_array(), 0);
        assert_eq!(headless.bound_buffer(BufferTarget::Vertex), 0);
        assert_eq!(headless.bound_buffer(BufferTarget::Index), 0);
    }

    #[test]
    fn test_owning_drop_releases() {
        let ctx = headless_ctx();
        let id = {
            let array = VertexArray::new(&ctx);
            array.id()
        };
        let backend = ctx.backend_mut();
        let headless = backend
            .as_any()
            .downcast_ref::<HeadlessBackend>()
            .expect("headless backend");
        assert!(!headless.vertex_array_alive(id));
    }
}
