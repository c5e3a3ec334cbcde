//! # gl_kit
//!
//! A typed resource ownership and window lifecycle layer over OpenGL and
//! GLFW.
//!
//! ## Features
//!
//! - **Move-only GPU wrappers**: buffers, vertex arrays, shader programs
//!   and meshes release their backend objects exactly once, on drop
//! - **Named registries**: every resource kind lives in a name-to-resource
//!   map with collision-free generated names and most-recently-used access
//! - **Window lifecycle**: per-frame logic and render callbacks, event
//!   dispatch, lazy viewport handling
//! - **Application loop**: drives every registered window to completion
//! - **Swappable backend**: the GLFW/OpenGL backend for real windows, a
//!   headless recording backend for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gl_kit::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     gl_kit::logging::init();
//!
//!     let backend = OpenGlBackend::new()?;
//!     let mut app = App::new(Box::new(backend), WindowConfig::new("My Application"))?;
//!     app.run(&mut ())?; // loop until every window is closed
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod app;
pub mod backend;
pub mod config;
pub mod context;
pub mod input;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod resources;
pub mod window;

pub use app::{App, AppError, AppResult, Lifecycle};
pub use context::Context;
pub use manager::ResourceManager;
pub use registry::{Registry, RegistryError, RegistryResult};
pub use window::Window;

/// Common imports for crate users
pub mod prelude {
    pub use crate::app::{App, AppError, AppResult, Lifecycle};
    pub use crate::backend::{
        BackendError, BackendId, GraphicsBackend, HeadlessBackend, OpenGlBackend, WindowId,
    };
    pub use crate::config::{AppConfig, Config, CursorMode, WindowConfig};
    pub use crate::context::Context;
    pub use crate::input::{Action, Key, KeyState, MouseButton};
    pub use crate::manager::ResourceManager;
    pub use crate::registry::{Registry, RegistryError};
    pub use crate::resources::{
        Buffer, Camera, Mesh, MeshOwnership, Resource, ResourceKind, ShaderError, ShaderProgram,
        Texture, VertexArray,
    };
    pub use crate::window::Window;
}
