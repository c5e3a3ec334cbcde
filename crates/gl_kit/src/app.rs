//! Application lifecycle and main loop
//!
//! The application owns the graphics context and the resource manager,
//! guarantees a single instance per process, and drives every registered
//! window once per frame until none is left running.

use crate::backend::{BackendError, GraphicsBackend};
use crate::config::WindowConfig;
use crate::context::Context;
use crate::manager::ResourceManager;
use crate::registry::RegistryError;
use crate::window::Window;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Set on the first successful construction and never cleared; the single
/// instance constraint is per process, not per context.
static APP_CREATED: AtomicBool = AtomicBool::new(false);

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// A second application was constructed in the same process.
    #[error("only one application may be created per process")]
    DuplicateInstance,

    /// Backend error propagated to application level.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Registry error propagated to application level.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Custom application error raised from a lifecycle hook.
    #[error("application error: {0}")]
    Custom(String),
}

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Startup and shutdown hooks around the main loop.
///
/// Both default to doing nothing; `()` implements the trait for hook-less
/// runs.
pub trait Lifecycle {
    /// Called once before the first frame.
    fn startup(&mut self, app: &mut App) -> AppResult<()> {
        let _ = app;
        Ok(())
    }

    /// Called once after the loop exits.
    fn shutdown(&mut self, app: &mut App) {
        let _ = app;
    }
}

impl Lifecycle for () {}

/// The application: context, resources and the main loop.
///
/// Construction registers exactly one window, so a fresh application is
/// immediately runnable. Exactly one `App` may exist per process; a second
/// construction fails with [`AppError::DuplicateInstance`].
pub struct App {
    // Declared before `ctx` so every resource releases its backend objects
    // while the backend is still alive.
    resources: ResourceManager,
    ctx: Context,
    running: bool,
}

impl App {
    /// Create the application on `backend` and open the main window.
    pub fn new(backend: Box<dyn GraphicsBackend>, config: WindowConfig) -> AppResult<Self> {
        if APP_CREATED.swap(true, Ordering::SeqCst) {
            log::error!("refusing to create a second application instance");
            return Err(AppError::DuplicateInstance);
        }
        log::info!("creating application ({:?})", config.title);

        let ctx = Context::new(backend);
        let mut resources = ResourceManager::new(&ctx);

        let window = Window::open(&ctx, &config)?;
        resources.windows.record(window, &config.title);

        Ok(Self {
            resources,
            ctx,
            running: true,
        })
    }

    /// The graphics context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The resource manager.
    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    /// Mutable access to the resource manager.
    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    /// Open another window and register it under its title.
    pub fn create_window(&mut self, config: &WindowConfig) -> AppResult<String> {
        let window = Window::open(&self.ctx, config)?;
        Ok(self.resources.windows.record(window, &config.title))
    }

    /// The most recently touched window.
    pub fn current_window(&mut self) -> AppResult<&mut Window> {
        Ok(self.resources.windows.most_recent()?)
    }

    /// Whether the last loop pass had at least one running window.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run the main loop.
    ///
    /// Calls the startup hook, then updates every registered window each
    /// pass, removing the ones that stopped running before the next pass
    /// begins. The loop ends when no window is left running; the shutdown
    /// hook runs afterwards.
    pub fn run(&mut self, hooks: &mut dyn Lifecycle) -> AppResult<()> {
        hooks.startup(self)?;
        log::info!("entering main loop");

        let mut dead_windows = Vec::new();
        loop {
            self.running = false;

            for (name, window) in self.resources.windows.iter_mut() {
                window.update();
                if window.is_running() {
                    self.running = true;
                } else {
                    dead_windows.push(name.clone());
                }
            }

            for name in dead_windows.drain(..) {
                log::info!("window {name:?} stopped running, removing it");
                self.resources.windows.remove(&name);
            }

            if !self.running {
                break;
            }
        }

        log::info!("main loop finished");
        hooks.shutdown(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessBackend, WindowEvent};
    use crate::input::{Action, Key};

    struct CountingHooks {
        startups: usize,
        shutdowns: usize,
    }

    impl Lifecycle for CountingHooks {
        fn startup(&mut self, _app: &mut App) -> AppResult<()> {
            self.startups += 1;
            Ok(())
        }

        fn shutdown(&mut self, _app: &mut App) {
            self.shutdowns += 1;
        }
    }

    // The single-instance flag is process-wide and never cleared, so every
    // scenario that needs a live App runs inside this one test.
    #[test]
    fn test_application_lifecycle() {
        let mut app = App::new(
            Box::new(HeadlessBackend::new()),
            WindowConfig::new("main window"),
        )
        .expect("first application");

        // A second construction in the same process must fail.
        match App::new(Box::new(HeadlessBackend::new()), WindowConfig::default()) {
            Err(AppError::DuplicateInstance) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("second application construction must fail"),
        }

        // The main window is registered under the configured title.
        assert_eq!(app.resources().windows.len(), 1);
        assert!(app.resources().windows.contains("main window"));

        // A second window joins the registry.
        let second = app
            .create_window(&WindowConfig::new("tools"))
            .expect("second window");
        assert_eq!(app.resources().windows.len(), 2);

        // Close the second window via a synthetic escape press; the first
        // via the backend close flag after three frames.
        let main_id = app
            .resources_mut()
            .windows
            .get_mut("main window")
            .expect("main window")
            .id();
        let second_id = app
            .resources_mut()
            .windows
            .get_mut(&second)
            .expect("tools window")
            .id();
        {
            let mut backend = app.context().backend_mut();
            let headless = backend
                .as_any_mut()
                .downcast_mut::<HeadlessBackend>()
                .expect("headless backend");
            headless.push_event(
                second_id,
                WindowEvent::Key {
                    key: Key::Escape,
                    action: Action::Press,
                },
            );
            headless.close_after_polls(main_id, 3);
        }

        let mut hooks = CountingHooks {
            startups: 0,
            shutdowns: 0,
        };
        app.run(&mut hooks).expect("run");

        // Every window that stopped running was removed and the loop ended
        // with an empty registry.
        assert!(app.resources().windows.is_empty());
        assert!(!app.is_running());
        assert_eq!(hooks.startups, 1);
        assert_eq!(hooks.shutdowns, 1);
    }
}
