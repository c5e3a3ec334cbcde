//! RAII wrappers for backend-owned objects
//!
//! Every GPU object is represented as an id plus an ownership flag
//! ([`GpuHandle`]); the wrapper types around it are move-only, so at most
//! one live value owns a given backend id and a double release is a
//! compile-time error rather than a runtime one.

pub mod buffer;
pub mod camera;
pub mod mesh;
pub mod shader;
pub mod texture;
pub mod vertex_array;

pub use buffer::Buffer;
pub use camera::Camera;
pub use mesh::{Mesh, MeshOwnership};
pub use shader::{ShaderError, ShaderProgram, ShaderResult};
pub use texture::Texture;
pub use vertex_array::VertexArray;

use crate::backend::BackendId;

/// The resource kinds a [`crate::manager::ResourceManager`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Vertex or index buffer objects.
    Buffer,
    /// Cameras (CPU-side, no backend object).
    Camera,
    /// Composite meshes.
    Mesh,
    /// Shader programs.
    Shader,
    /// Textures.
    Texture,
    /// Vertex array objects.
    VertexArray,
    /// Windows.
    Window,
}

impl ResourceKind {
    pub(crate) const COUNT: usize = 7;

    /// Prefix used when a registry has to generate a fresh name.
    pub fn generated_prefix(self) -> &'static str {
        match self {
            Self::Buffer => "generated-bo-",
            Self::Camera => "generated-camera-",
            Self::Mesh => "generated-mesh-",
            Self::Shader => "generated-shader-",
            Self::Texture => "generated-texture-",
            Self::VertexArray => "generated-vao-",
            Self::Window => "Generated Window ",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Buffer => 0,
            Self::Camera => 1,
            Self::Mesh => 2,
            Self::Shader => 3,
            Self::Texture => 4,
            Self::VertexArray => 5,
            Self::Window => 6,
        }
    }
}

/// An object that can live in a named registry.
pub trait Resource {
    /// Which registry kind the type belongs to.
    const KIND: ResourceKind;

    /// The wrapped backend id, if the resource has one. Used by
    /// reverse lookups; `None` never matches.
    fn backend_id(&self) -> Option<BackendId>;

    /// Give up ownership of the wrapped backend object(s) without releasing
    /// them; dropping the resource afterwards is a no-op backend-wise.
    fn disown(&mut self);
}

/// A backend object id paired with an ownership flag.
///
/// `id == 0` means invalid/unallocated. The handle itself does not talk to
/// the backend; the enclosing wrapper decides which delete call ownership
/// implies. [`GpuHandle::take`] moves the id and flag out, resetting the
/// source to `{0, false}`, which is the explicit form of the transfer that
/// otherwise happens whenever a wrapper is moved.
#[derive(Debug, Default)]
pub struct GpuHandle {
    id: BackendId,
    owns: bool,
}

impl GpuHandle {
    /// Wrap a freshly allocated id as owning.
    pub fn acquire(id: BackendId) -> Self {
        Self { id, owns: true }
    }

    /// Wrap an existing id with explicit ownership.
    pub fn adopt(id: BackendId, owns: bool) -> Self {
        Self { id, owns }
    }

    /// The wrapped backend id (0 when invalid).
    pub fn id(&self) -> BackendId {
        self.id
    }

    /// Whether dropping the enclosing wrapper should release the id.
    pub fn owns(&self) -> bool {
        self.owns
    }

    /// Whether the handle refers to an allocated backend object.
    pub fn is_valid(&self) -> bool {
        self.id != 0
    }

    /// Keep the id but stop owning it.
    pub fn disown(&mut self) {
        self.owns = false;
    }

    /// Move id and ownership out, leaving `{0, false}` behind.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Reset to `{0, false}`. Called by wrappers after releasing.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl PartialEq for GpuHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GpuHandle {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_resets_source() {
        let mut handle = GpuHandle::acquire(7);
        let moved = handle.take();
        assert_eq!(moved.id(), 7);
        assert!(moved.owns());
        assert_eq!(handle.id(), 0);
        assert!(!handle.owns());
        assert!(!handle.is_valid());
    }

    #[test]
    fn test_equality_ignores_ownership() {
        assert_eq!(GpuHandle::acquire(3), GpuHandle::adopt(3, false));
        assert_ne!(GpuHandle::acquire(3), GpuHandle::acquire(4));
    }
}
