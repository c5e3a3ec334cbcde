//! Buffer object wrapper
//!
//! Holds the handle to a vertex or index buffer, owning or non-owning.

use crate::backend::{BackendId, BufferTarget, BufferUsage};
use crate::context::Context;
use crate::resources::{GpuHandle, Resource, ResourceKind};

/// A vertex or index buffer object.
///
/// Move-only; the backend buffer is released when an owning wrapper is
/// dropped or [`Buffer::clear`]ed.
pub struct Buffer {
    ctx: Context,
    handle: GpuHandle,
    target: BufferTarget,
}

impl Buffer {
    /// Allocate a new buffer of the given target.
    pub fn new(ctx: &Context, target: BufferTarget) -> Self {
        let id = ctx.backend_mut().create_buffer();
        log::debug!("generated buffer object {id} ({target:?})");
        Self {
            ctx: ctx.clone(),
            handle: GpuHandle::acquire(id),
            target,
        }
    }

    /// Wrap an existing buffer object with explicit ownership. Passing id 0
    /// allocates a fresh, owned buffer instead.
    pub fn from_raw(ctx: &Context, id: BackendId, target: BufferTarget, owns: bool) -> Self {
        if id == 0 {
            return Self::new(ctx, target);
        }
        log::debug!("wrapping existing buffer object {id} (owning: {owns})");
        Self {
            ctx: ctx.clone(),
            handle: GpuHandle::adopt(id, owns),
            target,
        }
    }

    /// The wrapped backend id (0 when released).
    pub fn id(&self) -> BackendId {
        self.handle.id()
    }

    /// The binding target this buffer was created for.
    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// Whether this wrapper holds the given backend id.
    pub fn wraps(&self, id: BackendId) -> bool {
        self.handle.id() == id
    }

    /// Bind the buffer to its target.
    pub fn bind(&self) {
        self.ctx
            .backend_mut()
            .bind_buffer(self.target, self.handle.id());
    }

    /// Unbind whatever is bound to this buffer's target.
    pub fn unbind(&self) {
        self.ctx.backend_mut().bind_buffer(self.target, 0);
    }

    /// Bind the buffer and upload `data` as static draw data.
    pub fn upload<T: bytemuck::Pod>(&self, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        log::debug!(
            "uploading {} bytes to buffer object {}",
            bytes.len(),
            self.handle.id()
        );
        let mut backend = self.ctx.backend_mut();
        backend.bind_buffer(self.target, self.handle.id());
        backend.buffer_data(self.target, bytes, BufferUsage::StaticDraw);
    }

    /// Release the backend buffer if owned and invalidate the handle.
    /// Safe to call more than once.
    pub fn clear(&mut self) {
        if self.handle.owns() && self.handle.is_valid() {
            log::debug!("deleting buffer object {}", self.handle.id());
            self.ctx.backend_mut().delete_buffer(self.handle.id());
        }
        self.handle.reset();
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.clear();
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Resource for Buffer {
    const KIND: ResourceKind = ResourceKind::Buffer;

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

    fn buffer_alive(ctx: &Context, id: BackendId) -> bool {
        ctx.backend_mut()
            .as_any()
            .downcast_ref::<HeadlessBackend>()
            .expect("headless backend")
            .buffer_alive(id)
    }

    #[test]
    fn test_owning_drop_releases_backend_buffer() {
        let ctx = headless_ctx();
        let id = {
            let buffer = Buffer::new(&ctx, BufferTarget::Vertex);
            assert!(buffer_alive(&ctx, buffer.id()));
            buffer.id()
        };
        assert!(!buffer_alive(&ctx, id));
    }

    #[test]
    fn test_non_owning_drop_never_deletes() {
        let ctx = headless_ctx();
        let id = ctx.backend_mut().create_buffer();
        {
            let borrowed = Buffer::from_raw(&ctx, id, BufferTarget::Vertex, false);
            assert!(borrowed.wraps(id));
        }
        assert!(buffer_alive(&ctx, id));
    }

    #[test]
    fn test_disowned_buffer_keeps_backend_object() {
        let ctx = headless_ctx();
        let mut buffer = Buffer::new(&ctx, BufferTarget::Index);
        let id = buffer.id();
        buffer.disown();
        drop(buffer);
        assert!(buffer_alive(&ctx, id));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let ctx = headless_ctx();
        let mut buffer = Buffer::new(&ctx, BufferTarget::Vertex);
        let id = buffer.id();
        buffer.clear();
        assert!(!buffer_alive(&ctx, id));
        assert_eq!(buffer.id(), 0);
        buffer.clear();
        assert_eq!(buffer.backend_id(), None);
    }

    #[test]
    fn test_from_raw_zero_allocates_fresh() {
        let ctx = headless_ctx();
        let buffer = Buffer::from_raw(&ctx, 0, BufferTarget::Vertex, false);
        assert!(buffer.id() != 0);
        assert!(buffer_alive(&ctx, buffer.id()));
    }

    #[test]
    fn test_upload_records_byte_length() {
        let ctx = headless_ctx();
        let buffer = Buffer::new(&ctx, BufferTarget::Vertex);
        buffer.upload(&[1.0f32, 2.0, 3.0]);
        let backend = ctx.backend_mut();
        let headless = backend
            .as_any()
            .downcast_ref::<HeadlessBackend>()
            .expect("headless backend");
        assert_eq!(headless.upload_len(buffer.id()), Some(12));
    }
}
