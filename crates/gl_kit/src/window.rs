//! Window lifecycle
//!
//! A window wraps one backend window handle and drives a frame through
//! [`Window::update`]: logic callback, render callback, buffer swap, event
//! processing, liveness check. The application loop calls `update` once per
//! frame for every registered window.

use crate::backend::{BackendId, WindowEvent, WindowId};
use crate::config::WindowConfig;
use crate::context::Context;
use crate::input::{Action, Key, KeyState};
use crate::resources::{GpuHandle, Resource, ResourceKind};

/// Per-frame callback; receives the window and the frame's delta time in
/// seconds.
pub type FrameCallback = Box<dyn FnMut(&mut Window, f64)>;

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// A window plus its per-frame state.
///
/// The logic callback always runs before the render callback. Both default
/// to doing nothing.
pub struct Window {
    ctx: Context,
    handle: GpuHandle,

    position: (i32, i32),
    size: (i32, i32),
    viewport_size: (i32, i32),
    cursor_last: (f64, f64),
    cursor_delta: (f64, f64),
    cursor_seeded: bool,
    last_time: f64,

    render_callback: Option<FrameCallback>,
    logic_callback: Option<FrameCallback>,
    key_state: KeyState,

    update_viewport: bool,
    running: bool,
}

impl Window {
    /// Open a backend window from `config`.
    ///
    /// The window owns its backend handle and closes it on drop. The
    /// viewport is applied lazily on the first [`Window::update`].
    pub fn open(ctx: &Context, config: &WindowConfig) -> crate::backend::BackendResult<Self> {
        let mut backend = ctx.backend_mut();
        let id = backend.open_window(config)?;
        log::info!("opened window {id} ({:?})", config.title);
        let position = backend.window_position(id);
        let size = backend.window_size(id);
        let last_time = backend.time();
        drop(backend);

        Ok(Self {
            ctx: ctx.clone(),
            handle: GpuHandle::acquire(id),
            position,
            size,
            viewport_size: (0, 0),
            cursor_last: (0.0, 0.0),
            cursor_delta: (0.0, 0.0),
            cursor_seeded: false,
            last_time,
            render_callback: None,
            logic_callback: None,
            key_state: KeyState::default(),
            update_viewport: true,
            running: true,
        })
    }

    /// Wrap a backend window owned by someone else. Dropping the wrapper
    /// leaves the backend window open.
    pub fn from_raw(ctx: &Context, id: WindowId) -> Self {
        let backend = ctx.backend_mut();
        let position = backend.window_position(id);
        let size = backend.window_size(id);
        let last_time = backend.time();
        drop(backend);

        Self {
            ctx: ctx.clone(),
            handle: GpuHandle::adopt(id, false),
            position,
            size,
            viewport_size: (0, 0),
            cursor_last: (0.0, 0.0),
            cursor_delta: (0.0, 0.0),
            cursor_seeded: false,
            last_time,
            render_callback: None,
            logic_callback: None,
            key_state: KeyState::default(),
            update_viewport: true,
            running: true,
        }
    }

    /// The backend window id.
    pub fn id(&self) -> WindowId {
        self.handle.id()
    }

    /// Whether the window survived its last [`Window::update`].
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Request the window to close; honored at the end of the next update.
    pub fn close(&mut self) {
        self.ctx
            .backend_mut()
            .set_should_close(self.handle.id(), true);
    }

    /// Replace the render callback.
    pub fn set_render_callback(&mut self, callback: impl FnMut(&mut Window, f64) + 'static) {
        self.render_callback = Some(Box::new(callback));
    }

    /// Replace the logic callback.
    pub fn set_logic_callback(&mut self, callback: impl FnMut(&mut Window, f64) + 'static) {
        self.logic_callback = Some(Box::new(callback));
    }

    /// Currently held keys, as maintained by the default key handler.
    pub fn key_state(&self) -> &KeyState {
        &self.key_state
    }

    /// The cursor movement since the last call; consuming, the stored delta
    /// resets to zero.
    pub fn cursor_delta(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.cursor_delta)
    }

    /// Window size in screen coordinates, as tracked through resize events.
    pub fn size(&self) -> (i32, i32) {
        self.size
    }

    /// Viewport size in pixels, as of the last viewport update.
    pub fn viewport_size(&self) -> (i32, i32) {
        self.viewport_size
    }

    /// Window position, as last queried from the backend.
    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    /// Move the window.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = (x, y);
        self.ctx
            .backend_mut()
            .set_window_position(self.handle.id(), x, y);
    }

    /// Resize the window.
    pub fn set_size(&mut self, width: i32, height: i32) {
        self.size = (width, height);
        self.update_viewport = true;
        self.ctx
            .backend_mut()
            .set_window_size(self.handle.id(), width, height);
    }

    /// Update the title bar text.
    pub fn set_title(&mut self, title: &str) {
        self.ctx
            .backend_mut()
            .set_window_title(self.handle.id(), title);
    }

    /// Window opacity in `[0, 1]`.
    pub fn opacity(&self) -> f32 {
        self.ctx.backend_mut().window_opacity(self.handle.id())
    }

    /// Set window opacity.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.ctx
            .backend_mut()
            .set_window_opacity(self.handle.id(), opacity);
    }

    /// Drive one frame.
    ///
    /// Order is fixed: make the context current, apply a pending viewport
    /// change, compute delta time, clear, logic callback, render callback,
    /// swap, process events, then recompute the running flag from the
    /// escape key and the backend close flag.
    pub fn update(&mut self) {
        let id = self.handle.id();

        {
            let mut backend = self.ctx.backend_mut();
            backend.make_current(id);
            if self.update_viewport {
                let (width, height) = backend.framebuffer_size(id);
                self.viewport_size = (width, height);
                backend.viewport(0, 0, width, height);
                self.update_viewport = false;
            }
        }

        let now = self.ctx.backend_mut().time();
        let delta_time = now - self.last_time;
        self.last_time = now;

        self.ctx.backend_mut().clear_frame(CLEAR_COLOR);

        // Logic first, then render. Callbacks are moved out for the call so
        // they can borrow the window; one that replaces itself sticks.
        if let Some(mut callback) = self.logic_callback.take() {
            callback(self, delta_time);
            if self.logic_callback.is_none() {
                self.logic_callback = Some(callback);
            }
        }
        if let Some(mut callback) = self.render_callback.take() {
            callback(self, delta_time);
            if self.render_callback.is_none() {
                self.render_callback = Some(callback);
            }
        }

        {
            let mut backend = self.ctx.backend_mut();
            backend.swap_buffers(id);
            backend.poll_events();
        }
        let events = self.ctx.backend_mut().drain_events(id);
        for event in events {
            self.handle_event(event);
        }

        let (escape, should_close) = {
            let backend = self.ctx.backend_mut();
            (
                backend.key_pressed(id, Key::Escape),
                backend.should_close(id),
            )
        };
        self.running = self.running && !escape && !should_close;
    }

    fn handle_event(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::Resized { width, height } => {
                self.size = (width, height);
                self.update_viewport = true;
            }
            WindowEvent::Key { key, action } => {
                if key == Key::Escape && action == Action::Press {
                    self.close();
                }
                match action {
                    Action::Press => self.key_state.set(key, true),
                    Action::Release => self.key_state.set(key, false),
                    Action::Repeat => {}
                }
            }
            WindowEvent::CursorMoved { x, y } => {
                if !self.cursor_seeded {
                    self.cursor_last = (x, y);
                    self.cursor_seeded = true;
                }
                // Screen y grows downward; the delta reports up as positive.
                self.cursor_delta = (x - self.cursor_last.0, self.cursor_last.1 - y);
                self.cursor_last = (x, y);
            }
            WindowEvent::MouseButton { .. } => {}
            WindowEvent::CloseRequested => {
                self.close();
            }
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.handle.owns() && self.handle.is_valid() {
            log::info!("closing window {}", self.handle.id());
            self.ctx.backend_mut().close_window(self.handle.id());
        }
        self.handle.reset();
    }
}

impl Resource for Window {
    const KIND: ResourceKind = ResourceKind::Window;

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

    fn open_window(ctx: &Context) -> Window {
        Window::open(ctx, &WindowConfig::default()).expect("open window")
    }

    fn push_event(ctx: &Context, id: WindowId, event: WindowEvent) {
        ctx.backend_mut()
            .as_any_mut()
            .downcast_mut::<HeadlessBackend>()
            .expect("headless backend")
            .push_event(id, event);
    }

    #[test]
    fn test_update_applies_viewport_once_until_resize() {
        let ctx = headless_ctx();
        let mut window = open_window(&ctx);
        window.update();
        assert_eq!(window.viewport_size(), (800, 600));

        push_event(
            &ctx,
            window.id(),
            WindowEvent::Resized {
                width: 1024,
                height: 768,
            },
        );
        window.update(); // drains the resize event
        assert_eq!(window.size(), (1024, 768));
        window.update(); // applies the flagged viewport change
        assert_eq!(window.viewport_size(), (1024, 768));
        assert!(window.is_running());
    }

    #[test]
    fn test_logic_runs_before_render() {
        let ctx = headless_ctx();
        let mut window = open_window(&ctx);
        let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));

        let seen = order.clone();
        window.set_logic_callback(move |_, _| seen.borrow_mut().push("logic"));
        let seen = order.clone();
        window.set_render_callback(move |_, _| seen.borrow_mut().push("render"));

        window.update();
        assert_eq!(*order.borrow(), vec!["logic", "render"]);
    }

    #[test]
    fn test_escape_press_stops_the_window() {
        let ctx = headless_ctx();
        let mut window = open_window(&ctx);
        push_event(
            &ctx,
            window.id(),
            WindowEvent::Key {
                key: Key::Escape,
                action: Action::Press,
            },
        );
        window.update();
        assert!(!window.is_running());
    }

    #[test]
    fn test_key_events_toggle_key_state() {
        let ctx = headless_ctx();
        let mut window = open_window(&ctx);
        push_event(
            &ctx,
            window.id(),
            WindowEvent::Key {
                key: Key::W,
                action: Action::Press,
            },
        );
        window.update();
        assert!(window.key_state().is_pressed(Key::W));

        push_event(
            &ctx,
            window.id(),
            WindowEvent::Key {
                key: Key::W,
                action: Action::Release,
            },
        );
        window.update();
        assert!(!window.key_state().is_pressed(Key::W));
    }

    #[test]
    fn test_cursor_delta_is_consumed() {
        let ctx = headless_ctx();
        let mut window = open_window(&ctx);
        push_event(&ctx, window.id(), WindowEvent::CursorMoved { x: 10.0, y: 10.0 });
        window.update();
        // First event only seeds the last position.
        assert_eq!(window.cursor_delta(), (0.0, 0.0));

        push_event(&ctx, window.id(), WindowEvent::CursorMoved { x: 14.0, y: 7.0 });
        window.update();
        assert_eq!(window.cursor_delta(), (4.0, 3.0));
        assert_eq!(window.cursor_delta(), (0.0, 0.0));
    }

    #[test]
    fn test_close_flag_stops_the_window() {
        let ctx = headless_ctx();
        let mut window = open_window(&ctx);
        window.update();
        assert!(window.is_running());
        window.close();
        window.update();
        assert!(!window.is_running());
    }

    #[test]
    fn test_setters_reach_the_backend() {
        let ctx = headless_ctx();
        let mut window = open_window(&ctx);
        window.set_position(40, 30);
        window.set_size(640, 480);
        window.set_opacity(0.5);
        assert_eq!(window.position(), (40, 30));
        assert_eq!(window.size(), (640, 480));
        assert_eq!(window.opacity(), 0.5);
        window.update();
        assert_eq!(window.viewport_size(), (640, 480));

        let backend = ctx.backend_mut();
        let headless = backend
            .as_any()
            .downcast_ref::<HeadlessBackend>()
            .expect("headless backend");
        assert_eq!(headless.current_window(), window.id());
        assert_eq!(headless.last_viewport(), (0, 0, 640, 480));
    }

    #[test]
    fn test_borrowed_window_is_not_closed_on_drop() {
        let ctx = headless_ctx();
        let owner = open_window(&ctx);
        let id = owner.id();
        {
            let borrowed = Window::from_raw(&ctx, id);
            assert_eq!(borrowed.id(), id);
        }
        let backend = ctx.backend_mut();
        let headless = backend
            .as_any()
            .downcast_ref::<HeadlessBackend>()
            .expect("headless backend");
        assert!(headless.window_alive(id));
    }
}
