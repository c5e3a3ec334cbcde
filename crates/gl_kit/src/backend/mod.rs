//! Backend-agnostic graphics capability surface
//!
//! This module defines the trait every graphics backend must implement.
//! The rest of the crate talks to the GPU and the window system exclusively
//! through [`GraphicsBackend`], so resource wrappers, registries and the
//! application loop never depend on a specific API.
//!
//! Two implementations ship with the crate:
//!
//! - [`opengl::OpenGlBackend`]: the real thing, built on GLFW and OpenGL
//! - [`headless::HeadlessBackend`]: an allocate-and-record backend for tests
//!   and headless runs

pub mod headless;
pub mod opengl;

use crate::config::WindowConfig;
use crate::input::{Action, Key, MouseButton};
use thiserror::Error;

pub use headless::HeadlessBackend;
pub use opengl::OpenGlBackend;

/// Opaque backend object id. Zero means invalid/unallocated; every
/// successful allocation returns a non-zero id.
pub type BackendId = u32;

/// Backend id naming a window.
pub type WindowId = BackendId;

/// Location of a shader uniform inside a linked program (-1 when absent).
pub type UniformLocation = i32;

/// Backend-level errors
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend itself failed to come up.
    #[error("backend initialization failed: {0}")]
    Init(String),

    /// A window could not be opened.
    #[error("window creation failed: {0}")]
    WindowCreation(String),

    /// A shader failed to compile or a program failed to link; carries the
    /// backend's error log text.
    #[error("shader build failed: {0}")]
    CompileOrLink(String),
}

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Buffer binding targets supported by the wrapper layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data (a VBO).
    Vertex,
    /// Element index data (an EBO).
    Index,
}

/// Upload frequency hint forwarded to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    StaticDraw,
    /// Rewritten regularly.
    DynamicDraw,
    /// Rewritten every frame.
    StreamDraw,
}

/// Shader pipeline stages the wrapper layer compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

/// A window-system event, delivered as a value.
///
/// Events are queued per window inside the backend and drained with
/// [`GraphicsBackend::drain_events`]. Nothing here carries a pointer back
/// into caller state, so a window can be dropped without deregistering
/// anything: closing the backend window discards its queue.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    /// The window size changed.
    Resized {
        /// New width in screen coordinates.
        width: i32,
        /// New height in screen coordinates.
        height: i32,
    },
    /// A key changed state.
    Key {
        /// Which key.
        key: Key,
        /// Press, release or repeat.
        action: Action,
    },
    /// A mouse button changed state.
    MouseButton {
        /// Which button.
        button: MouseButton,
        /// Press or release.
        action: Action,
    },
    /// The cursor moved to a new position (window coordinates).
    CursorMoved {
        /// Cursor x.
        x: f64,
        /// Cursor y.
        y: f64,
    },
    /// The user asked the window to close.
    CloseRequested,
}

/// Capability contract between the wrapper layer and a graphics backend.
///
/// Object-creating calls return non-zero ids; callers own the returned id
/// and are responsible for the matching delete. Operations on an id the
/// backend does not know are no-ops (queries return inert defaults), which
/// keeps drop paths safe after a backend object was released out of band.
///
/// All methods take `&mut self`; the crate is single-threaded and the
/// backend lives behind one `RefCell` in the [`crate::context::Context`].
pub trait GraphicsBackend {
    // Buffers

    /// Allocate a buffer object.
    fn create_buffer(&mut self) -> BackendId;

    /// Release a buffer object.
    fn delete_buffer(&mut self, buffer: BackendId);

    /// Bind a buffer (0 unbinds) to the given target.
    fn bind_buffer(&mut self, target: BufferTarget, buffer: BackendId);

    /// Upload raw bytes into the buffer currently bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    // Vertex arrays

    /// Allocate a vertex array object.
    fn create_vertex_array(&mut self) -> BackendId;

    /// Release a vertex array object.
    fn delete_vertex_array(&mut self, array: BackendId);

    /// Bind a vertex array (0 unbinds).
    fn bind_vertex_array(&mut self, array: BackendId);

    /// Describe a float attribute in the currently bound vertex buffer.
    fn attribute_pointer(&mut self, index: u32, components: i32, stride: i32, offset: usize);

    /// Enable a vertex attribute slot.
    fn enable_attribute(&mut self, index: u32);

    // Shader programs

    /// Allocate an empty program object.
    fn create_program(&mut self) -> BackendId;

    /// Release a program object.
    fn delete_program(&mut self, program: BackendId);

    /// Make a program current (0 unbinds).
    fn use_program(&mut self, program: BackendId);

    /// Compile `source` for `stage` and attach it to `program`.
    ///
    /// The stage object itself is backend-internal; it is flagged for
    /// deletion once attached. Failure carries the compile log.
    fn compile_shader(
        &mut self,
        program: BackendId,
        stage: ShaderStage,
        source: &str,
    ) -> BackendResult<()>;

    /// Link (and validate) a program. Failure carries the link log.
    fn link_program(&mut self, program: BackendId) -> BackendResult<()>;

    /// Look up a uniform location in a linked program (-1 when absent).
    fn uniform_location(&mut self, program: BackendId, name: &str) -> UniformLocation;

    /// Write a column-major 4x4 matrix uniform of the current program.
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &[f32; 16]);

    // Drawing

    /// Clear color and depth of the current framebuffer.
    fn clear_frame(&mut self, color: [f32; 4]);

    /// Set the viewport of the current context.
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Draw `index_count` indices from the bound vertex array as triangles.
    fn draw_indexed(&mut self, index_count: i32);

    // Windows and input

    /// Open a window and make its context current.
    fn open_window(&mut self, config: &WindowConfig) -> BackendResult<WindowId>;

    /// Close a window and discard its pending events.
    fn close_window(&mut self, window: WindowId);

    /// Make a window's context current.
    fn make_current(&mut self, window: WindowId);

    /// Whether the window's close flag is set. Unknown ids report `true`.
    fn should_close(&self, window: WindowId) -> bool;

    /// Set or clear the window's close flag.
    fn set_should_close(&mut self, window: WindowId, value: bool);

    /// Present the window's back buffer.
    fn swap_buffers(&mut self, window: WindowId);

    /// Pump the window system; fills per-window event queues.
    fn poll_events(&mut self);

    /// Take every event queued for `window` since the last drain.
    fn drain_events(&mut self, window: WindowId) -> Vec<WindowEvent>;

    /// Window size in screen coordinates.
    fn window_size(&self, window: WindowId) -> (i32, i32);

    /// Drawable framebuffer size in pixels.
    fn framebuffer_size(&self, window: WindowId) -> (i32, i32);

    /// Resize the window.
    fn set_window_size(&mut self, window: WindowId, width: i32, height: i32);

    /// Window position on screen.
    fn window_position(&self, window: WindowId) -> (i32, i32);

    /// Move the window.
    fn set_window_position(&mut self, window: WindowId, x: i32, y: i32);

    /// Update the title bar text.
    fn set_window_title(&mut self, window: WindowId, title: &str);

    /// Window opacity in `[0, 1]`.
    fn window_opacity(&self, window: WindowId) -> f32;

    /// Set window opacity.
    fn set_window_opacity(&mut self, window: WindowId, opacity: f32);

    /// Whether `key` is currently held down in `window`.
    fn key_pressed(&self, window: WindowId, key: Key) -> bool;

    /// Monotonic backend time in seconds.
    fn time(&self) -> f64;

    /// Concrete-type access for backend-specific inspection (tests).
    fn as_any(&self) -> &dyn std::any::Any;

    /// Mutable concrete-type access for backend-specific inspection (tests).
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
