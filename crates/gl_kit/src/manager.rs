//! Resource manager
//!
//! One named registry per resource kind, constructed together from a single
//! context. The registries share nothing but the context (and, through it,
//! the per-kind name counters); there are no cross-registry invariants.

use crate::context::Context;
use crate::registry::Registry;
use crate::resources::{Buffer, Camera, Mesh, ShaderProgram, Texture, VertexArray};
use crate::window::Window;

/// All resources owned by an application, grouped by kind.
pub struct ResourceManager {
    /// Vertex array objects.
    pub vertex_arrays: Registry<VertexArray>,
    /// Vertex and index buffers.
    pub buffers: Registry<Buffer>,
    /// Cameras.
    pub cameras: Registry<Camera>,
    /// Composite meshes.
    pub meshes: Registry<Mesh>,
    /// Shader programs.
    pub shaders: Registry<ShaderProgram>,
    /// Textures.
    pub textures: Registry<Texture>,
    /// Windows.
    pub windows: Registry<Window>,
}

impl ResourceManager {
    /// Create the per-kind registries on `ctx`.
    pub fn new(ctx: &Context) -> Self {
        log::debug!("creating resource manager");
        Self {
            vertex_arrays: Registry::new(ctx),
            buffers: Registry::new(ctx),
            cameras: Registry::new(ctx),
            meshes: Registry::new(ctx),
            shaders: Registry::new(ctx),
            textures: Registry::new(ctx),
            windows: Registry::new(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BufferTarget, HeadlessBackend};
    use crate::resources::{ResourceKind, Texture};

    #[test]
    fn test_registries_generate_kind_specific_names() {
        let ctx = Context::new(Box::new(HeadlessBackend::new()));
        let mut manager = ResourceManager::new(&ctx);

        let buffer_name = manager
            .buffers
            .emplace("", Buffer::new(&ctx, BufferTarget::Vertex));
        let array_name = manager.vertex_arrays.emplace("", VertexArray::new(&ctx));

        assert!(buffer_name.starts_with(ResourceKind::Buffer.generated_prefix()));
        assert!(array_name.starts_with(ResourceKind::VertexArray.generated_prefix()));
    }

    #[test]
    fn test_textures_are_tracked_by_name_and_id() {
        let ctx = Context::new(Box::new(HeadlessBackend::new()));
        let mut manager = ResourceManager::new(&ctx);
        let name = manager.textures.emplace("noise", Texture::wrap(17));
        assert_eq!(name, "noise");
        assert_eq!(manager.textures.find_by_backend_id(17), Some("noise"));
    }

    #[test]
    fn test_kinds_do_not_share_counters() {
        let ctx = Context::new(Box::new(HeadlessBackend::new()));
        let mut manager = ResourceManager::new(&ctx);
        let buffer_name = manager
            .buffers
            .emplace("", Buffer::new(&ctx, BufferTarget::Vertex));
        let array_name = manager.vertex_arrays.emplace("", VertexArray::new(&ctx));
        // Both kinds start from counter zero.
        assert!(buffer_name.ends_with('0'));
        assert!(array_name.ends_with('0'));
    }
}
