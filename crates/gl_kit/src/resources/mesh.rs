//! Composite mesh resource
//!
//! A mesh aggregates a vertex array, a vertex buffer and an index buffer,
//! each individually owned or borrowed. Which components get released on
//! drop is controlled by a [`MeshOwnership`] mask at construction.

use crate::backend::{BackendId, BufferTarget};
use crate::context::Context;
use crate::resources::{Buffer, Resource, ResourceKind, VertexArray};

bitflags::bitflags! {
    /// Which components of a [`Mesh`] the mesh releases on drop.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MeshOwnership: u32 {
        /// The vertex array object.
        const VERTEX_ARRAY = 1;
        /// The vertex buffer object.
        const VERTEX_BUFFER = 1 << 1;
        /// The index buffer object.
        const INDEX_BUFFER = 1 << 2;
        /// All three components.
        const ALL = Self::VERTEX_ARRAY.bits()
            | Self::VERTEX_BUFFER.bits()
            | Self::INDEX_BUFFER.bits();
    }
}

/// Vertex attribute slot used for positions.
const POSITION_ATTRIBUTE: u32 = 0;

/// A renderable collection of vertices and triangle indices.
///
/// `index_count` must match the indices actually uploaded to the index
/// buffer; rendering with a stale count after mutating the buffer out of
/// band is the caller's problem.
pub struct Mesh {
    vertex_array: VertexArray,
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: i32,
}

impl Mesh {
    /// Build a mesh from raw vertex positions and triangle indices.
    ///
    /// Vertices are flat `[x, y, z]` triplets; indices index into them in
    /// groups of three. All three backend objects are freshly allocated and
    /// owned, the data uploaded, and the position attribute configured.
    ///
    /// ```no_run
    /// # use gl_kit::backend::HeadlessBackend;
    /// # use gl_kit::context::Context;
    /// # use gl_kit::resources::Mesh;
    /// # let ctx = Context::new(Box::new(HeadlessBackend::new()));
    /// let vertices = [
    ///     -1.0f32, -1.0, 0.0, // bottom left
    ///     1.0, -1.0, 0.0, // bottom right
    ///     0.0, 1.0, 0.0, // top center
    ///     0.0, 0.0, 1.0, // above the origin
    /// ];
    /// let indices = [0u32, 1, 2, 0, 2, 3, 0, 3, 1, 1, 3, 2];
    /// let tetrahedron = Mesh::from_data(&ctx, &vertices, &indices);
    /// ```
    pub fn from_data(ctx: &Context, vertices: &[f32], indices: &[u32]) -> Self {
        let vertex_array = VertexArray::new(ctx);
        let vertex_buffer = Buffer::new(ctx, BufferTarget::Vertex);
        let index_buffer = Buffer::new(ctx, BufferTarget::Index);

        vertex_array.with_bound(|| {
            vertex_buffer.upload(vertices);
            index_buffer.upload(indices);

            let mut backend = ctx.backend_mut();
            backend.attribute_pointer(POSITION_ATTRIBUTE, 3, 0, 0);
            backend.enable_attribute(POSITION_ATTRIBUTE);
        });

        Self {
            vertex_array,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as i32,
        }
    }

    /// Wrap existing backend objects.
    ///
    /// Only components whose bit is set in `owned` are released when the
    /// mesh is dropped. A zero id in any slot is allocated fresh and owned
    /// regardless of the mask.
    pub fn from_raw(
        ctx: &Context,
        vertex_array: BackendId,
        vertex_buffer: BackendId,
        index_buffer: BackendId,
        index_count: i32,
        owned: MeshOwnership,
    ) -> Self {
        Self {
            vertex_array: VertexArray::from_raw(
                ctx,
                vertex_array,
                owned.contains(MeshOwnership::VERTEX_ARRAY),
            ),
            vertex_buffer: Buffer::from_raw(
                ctx,
                vertex_buffer,
                BufferTarget::Vertex,
                owned.contains(MeshOwnership::VERTEX_BUFFER),
            ),
            index_buffer: Buffer::from_raw(
                ctx,
                index_buffer,
                BufferTarget::Index,
                owned.contains(MeshOwnership::INDEX_BUFFER),
            ),
            index_count,
        }
    }

    /// Adopt components out of existing wrappers.
    ///
    /// For every component named in `owned` the mesh claims ownership and
    /// the source wrapper is disowned, so its drop becomes a no-op for that
    /// object. Components outside the mask stay with their wrappers.
    pub fn from_parts(
        vertex_array: &mut VertexArray,
        vertex_buffer: &mut Buffer,
        index_buffer: &mut Buffer,
        index_count: i32,
        owned: MeshOwnership,
    ) -> Self {
        let ctx = vertex_array.ctx.clone();
        let mesh = Self::from_raw(
            &ctx,
            vertex_array.id(),
            vertex_buffer.id(),
            index_buffer.id(),
            index_count,
            owned,
        );
        if owned.contains(MeshOwnership::VERTEX_ARRAY) {
            vertex_array.disown();
        }
        if owned.contains(MeshOwnership::VERTEX_BUFFER) {
            vertex_buffer.disown();
        }
        if owned.contains(MeshOwnership::INDEX_BUFFER) {
            index_buffer.disown();
        }
        mesh
    }

    /// Number of indices drawn by [`Mesh::render`].
    pub fn index_count(&self) -> i32 {
        self.index_count
    }

    /// The wrapped vertex array.
    pub fn vertex_array(&self) -> &VertexArray {
        &self.vertex_array
    }

    /// The wrapped vertex buffer.
    pub fn vertex_buffer(&self) -> &Buffer {
        &self.vertex_buffer
    }

    /// The wrapped index buffer.
    pub fn index_buffer(&self) -> &Buffer {
        &self.index_buffer
    }

    /// Draw the mesh as indexed triangles.
    ///
    /// Caller precondition: all three backend ids are non-zero. A cleared
    /// or zero vertex array is not guarded here; what the backend does with
    /// it is backend-defined.
    pub fn render(&self) {
        self.vertex_array.with_bound(|| {
            self.index_buffer.bind();
            self.vertex_array
                .ctx
                .backend_mut()
                .draw_indexed(self.index_count);
        });
    }

    /// Release all owned components and reset the index count.
    /// Safe to call more than once.
    pub fn clear(&mut self) {
        self.vertex_array.clear();
        self.vertex_buffer.clear();
        self.index_buffer.clear();
        self.index_count = 0;
    }
}

impl PartialEq for Mesh {
    fn eq(&self, other: &Self) -> bool {
        self.vertex_array == other.vertex_array
            && self.vertex_buffer == other.vertex_buffer
            && self.index_buffer == other.index_buffer
    }
}

impl Resource for Mesh {
    const KIND: ResourceKind = ResourceKind::Mesh;

    fn backend_id(&self) -> Option<BackendId> {
        self.vertex_array.backend_id()
    }

    fn disown(&mut self) {
        self.vertex_array.disown();
        self.vertex_buffer.disown();
        self.index_buffer.disown();
    }
}
