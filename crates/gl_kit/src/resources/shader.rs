//! Shader program wrapper
//!
//! Builds a program from vertex + fragment GLSL and caches the locations of
//! the three conventional transform uniforms (`model`, `view`,
//! `projection`). A program built from files remembers its paths and can be
//! rebuilt with [`ShaderProgram::reload`] after the sources change on disk.

use crate::backend::{BackendError, BackendId, ShaderStage, UniformLocation};
use crate::context::Context;
use crate::resources::{GpuHandle, Resource, ResourceKind};
use nalgebra::Matrix4;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the model matrix uniform.
pub const UNIFORM_MODEL: &str = "model";

/// Name of the view matrix uniform.
pub const UNIFORM_VIEW: &str = "view";

/// Name of the projection matrix uniform.
pub const UNIFORM_PROJECTION: &str = "projection";

/// Shader build and loading errors
#[derive(Error, Debug)]
pub enum ShaderError {
    /// Compile or link failure, carrying the backend log.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A shader source file could not be read.
    #[error("could not read shader source: {0}")]
    Io(#[from] std::io::Error),

    /// `reload` was called on a program not built from files.
    #[error("shader was not built from source files")]
    NoSourcePaths,
}

/// Result alias for shader operations.
pub type ShaderResult<T> = Result<T, ShaderError>;

struct BuiltProgram {
    handle: GpuHandle,
    uniform_model: UniformLocation,
    uniform_view: UniformLocation,
    uniform_projection: UniformLocation,
}

/// A linked shader program with its transform uniform locations.
pub struct ShaderProgram {
    ctx: Context,
    handle: GpuHandle,
    uniform_model: UniformLocation,
    uniform_view: UniformLocation,
    uniform_projection: UniformLocation,
    source_paths: Option<(PathBuf, PathBuf)>,
}

impl ShaderProgram {
    /// Compile and link a program from in-memory GLSL sources.
    pub fn from_sources(
        ctx: &Context,
        vertex_source: &str,
        fragment_source: &str,
    ) -> ShaderResult<Self> {
        let built = Self::build(ctx, vertex_source, fragment_source)?;
        Ok(Self {
            ctx: ctx.clone(),
            handle: built.handle,
            uniform_model: built.uniform_model,
            uniform_view: built.uniform_view,
            uniform_projection: built.uniform_projection,
            source_paths: None,
        })
    }

    /// Read, compile and link a program from two GLSL files.
    pub fn from_files(
        ctx: &Context,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> ShaderResult<Self> {
        let vertex_path = vertex_path.as_ref().to_path_buf();
        let fragment_path = fragment_path.as_ref().to_path_buf();
        log::info!(
            "loading shader sources from {} and {}",
            vertex_path.display(),
            fragment_path.display()
        );
        let vertex_source = std::fs::read_to_string(&vertex_path)?;
        let fragment_source = std::fs::read_to_string(&fragment_path)?;
        let mut program = Self::from_sources(ctx, &vertex_source, &fragment_source)?;
        program.source_paths = Some((vertex_path, fragment_path));
        Ok(program)
    }

    /// Rebuild the program from its source files.
    ///
    /// The new program is built first and only replaces the old one on
    /// success, so a failed reload leaves the current program usable.
    pub fn reload(&mut self) -> ShaderResult<()> {
        let (vertex_path, fragment_path) = match &self.source_paths {
            Some(paths) => paths.clone(),
            None => return Err(ShaderError::NoSourcePaths),
        };
        log::info!("reloading shader from {}", vertex_path.display());
        let vertex_source = std::fs::read_to_string(&vertex_path)?;
        let fragment_source = std::fs::read_to_string(&fragment_path)?;
        let built = Self::build(&self.ctx, &vertex_source, &fragment_source)?;

        self.clear();
        self.handle = built.handle;
        self.uniform_model = built.uniform_model;
        self.uniform_view = built.uniform_view;
        self.uniform_projection = built.uniform_projection;
        Ok(())
    }

    fn build(ctx: &Context, vertex_source: &str, fragment_source: &str) -> ShaderResult<BuiltProgram> {
        let mut backend = ctx.backend_mut();
        let program = backend.create_program();

        let stages = [
            (ShaderStage::Vertex, vertex_source),
            (ShaderStage::Fragment, fragment_source),
        ];
        for (stage, source) in stages {
            if let Err(error) = backend.compile_shader(program, stage, source) {
                log::error!("{stage:?} shader compilation failed: {error}");
                backend.delete_program(program);
                return Err(error.into());
            }
        }
        if let Err(error) = backend.link_program(program) {
            log::error!("shader program linking failed: {error}");
            backend.delete_program(program);
            return Err(error.into());
        }

        Ok(BuiltProgram {
            handle: GpuHandle::acquire(program),
            uniform_model: backend.uniform_location(program, UNIFORM_MODEL),
            uniform_view: backend.uniform_location(program, UNIFORM_VIEW),
            uniform_projection: backend.uniform_location(program, UNIFORM_PROJECTION),
        })
    }

    /// The wrapped program id (0 when released).
    pub fn id(&self) -> BackendId {
        self.handle.id()
    }

    /// Whether this wrapper holds the given program id.
    pub fn wraps(&self, id: BackendId) -> bool {
        self.handle.id() == id
    }

    /// Whether the program has been built and not cleared.
    pub fn initialized(&self) -> bool {
        self.handle.is_valid()
    }

    /// Location of the model matrix uniform.
    pub fn uniform_model(&self) -> UniformLocation {
        self.uniform_model
    }

    /// Location of the view matrix uniform.
    pub fn uniform_view(&self) -> UniformLocation {
        self.uniform_view
    }

    /// Location of the projection matrix uniform.
    pub fn uniform_projection(&self) -> UniformLocation {
        self.uniform_projection
    }

    /// Make the program current. No-op when not initialized.
    pub fn bind(&self) {
        if self.initialized() {
            self.ctx.backend_mut().use_program(self.handle.id());
        }
    }

    /// Unbind whatever program is current.
    pub fn unbind(&self) {
        self.ctx.backend_mut().use_program(0);
    }

    /// Write the model matrix uniform. The program must be bound.
    pub fn set_model(&self, matrix: &Matrix4<f32>) {
        self.set_mat4(self.uniform_model, matrix);
    }

    /// Write the view matrix uniform. The program must be bound.
    pub fn set_view(&self, matrix: &Matrix4<f32>) {
        self.set_mat4(self.uniform_view, matrix);
    }

    /// Write the projection matrix uniform. The program must be bound.
    pub fn set_projection(&self, matrix: &Matrix4<f32>) {
        self.set_mat4(self.uniform_projection, matrix);
    }

    fn set_mat4(&self, location: UniformLocation, matrix: &Matrix4<f32>) {
        let mut value = [0.0f32; 16];
        value.copy_from_slice(matrix.as_slice());
        self.ctx.backend_mut().set_uniform_mat4(location, &value);
    }

    /// Release the backend program if owned and invalidate the handle.
    /// Safe to call more than once.
    pub fn clear(&mut self) {
        if self.handle.owns() && self.handle.is_valid() {
            log::debug!("deleting shader program {}", self.handle.id());
            self.ctx.backend_mut().delete_program(self.handle.id());
        }
        self.handle.reset();
        self.uniform_model = -1;
        self.uniform_view = -1;
        self.uniform_projection = -1;
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.clear();
    }
}

impl PartialEq for ShaderProgram {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Resource for ShaderProgram {
    const KIND: ResourceKind = ResourceKind::Shader;

    fn backend_id(&self) -> Option<BackendId> {
        self.handle.is_valid().then(|| self.handle.id())
    }

    fn disown(&mut self) {
        self.handle.disown();
    }
}
