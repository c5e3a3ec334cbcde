//! Configuration types for applications and windows
//!
//! Window defaults follow the conventional 800x600 bordered, resizable,
//! visible window with an OpenGL 3.3 core profile context. Configurations
//! serialize through serde and load from TOML or RON files via the
//! [`Config`] trait.

use serde::{Deserialize, Serialize};

/// Default window title.
pub const DEFAULT_WINDOW_TITLE: &str = "OpenGL Application";

/// Default window width in screen coordinates.
pub const DEFAULT_WINDOW_WIDTH: i32 = 800;

/// Default window height in screen coordinates.
pub const DEFAULT_WINDOW_HEIGHT: i32 = 600;

/// Default OpenGL context version requested for new windows.
pub const DEFAULT_CONTEXT_VERSION: (u32, u32) = (3, 3);

/// Cursor handling mode for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    /// Visible cursor, free to leave the window.
    #[default]
    Normal,
    /// Invisible while over the window.
    Hidden,
    /// Captured by the window with unbounded virtual movement.
    Disabled,
}

/// Window creation parameters.
///
/// Field-per-trait rather than a hint bitmask: the window system hints the
/// backend derives from these are its own business.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Title bar text; also used as the registry name hint for the window.
    pub title: String,

    /// Width in screen coordinates; non-positive falls back to the default.
    pub width: i32,

    /// Height in screen coordinates; non-positive falls back to the default.
    pub height: i32,

    /// Whether the window can be resized by the user.
    pub resizable: bool,

    /// Whether the window has a border, title bar and close button.
    pub decorated: bool,

    /// Whether the window is initially visible.
    pub visible: bool,

    /// Whether the window grabs input focus on creation.
    pub focused: bool,

    /// Whether the window starts maximized.
    pub maximized: bool,

    /// Whether to cover the primary monitor instead of opening windowed.
    pub fullscreen: bool,

    /// Whether the window floats above normal windows.
    pub floating: bool,

    /// Whether the framebuffer is transparent.
    pub transparent: bool,

    /// Whether the cursor is centered over the window on creation.
    pub center_cursor: bool,

    /// Cursor handling mode applied after creation.
    pub cursor_mode: CursorMode,

    /// Requested OpenGL context major version.
    pub gl_major: u32,

    /// Requested OpenGL context minor version.
    pub gl_minor: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_WINDOW_TITLE.to_string(),
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            resizable: true,
            decorated: true,
            visible: true,
            focused: true,
            maximized: false,
            fullscreen: false,
            floating: false,
            transparent: false,
            center_cursor: false,
            cursor_mode: CursorMode::Normal,
            gl_major: DEFAULT_CONTEXT_VERSION.0,
            gl_minor: DEFAULT_CONTEXT_VERSION.1,
        }
    }
}

impl WindowConfig {
    /// Create a configuration with the given title and the usual defaults.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the window size.
    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the cursor mode.
    pub fn with_cursor_mode(mut self, mode: CursorMode) -> Self {
        self.cursor_mode = mode;
        self
    }

    /// Request a fullscreen window.
    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Size with non-positive dimensions replaced by the defaults.
    pub fn effective_size(&self) -> (i32, i32) {
        let width = if self.width <= 0 {
            DEFAULT_WINDOW_WIDTH
        } else {
            self.width
        };
        let height = if self.height <= 0 {
            DEFAULT_WINDOW_HEIGHT
        } else {
            self.height
        };
        (width, height)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Main window configuration.
    pub window: WindowConfig,
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// File loading and saving for configuration types.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file.
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to a `.toml` or `.ron` file.
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

impl Config for WindowConfig {}
impl Config for AppConfig {}
