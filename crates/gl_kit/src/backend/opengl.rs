//! GLFW + OpenGL backend
//!
//! The production [`GraphicsBackend`]: windows and input through GLFW,
//! object lifecycle and drawing through OpenGL. Window handles live in a
//! table keyed by the backend id the rest of the crate sees; nothing hands
//! out raw pointers.
//!
//! GLFW requires the main thread, and every GL entry point is only valid
//! with a current context, both of which the single-threaded design
//! guarantees. The GL function pointers are loaded once, when the first
//! window's context comes up.

use crate::backend::{
    BackendError, BackendId, BackendResult, BufferTarget, BufferUsage, GraphicsBackend,
    ShaderStage, UniformLocation, WindowEvent, WindowId,
};
use crate::config::{CursorMode, WindowConfig};
use crate::input::{Action, Key, MouseButton};
use gl::types::{GLchar, GLint, GLsizei, GLsizeiptr, GLuint};
use glfw::Context as _;
use std::collections::HashMap;
use std::ffi::CString;

const INFO_LOG_CAPACITY: usize = 1024;

struct WindowSlot {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

/// GLFW-backed implementation of the graphics capability surface.
pub struct OpenGlBackend {
    glfw: glfw::Glfw,
    windows: HashMap<WindowId, WindowSlot>,
    next_window_id: WindowId,
    gl_loaded: bool,
}

impl OpenGlBackend {
    /// Initialize GLFW.
    pub fn new() -> BackendResult<Self> {
        log::info!("initializing GLFW");
        let glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| BackendError::Init(e.to_string()))?;
        Ok(Self {
            glfw,
            windows: HashMap::new(),
            next_window_id: 0,
            gl_loaded: false,
        })
    }

    fn apply_window_hints(&mut self, config: &WindowConfig) {
        self.glfw.default_window_hints();
        self.glfw
            .window_hint(glfw::WindowHint::ContextVersion(config.gl_major, config.gl_minor));
        self.glfw.window_hint(glfw::WindowHint::OpenGlProfile(
            glfw::OpenGlProfileHint::Core,
        ));
        self.glfw
            .window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        self.glfw
            .window_hint(glfw::WindowHint::Resizable(config.resizable));
        self.glfw
            .window_hint(glfw::WindowHint::Decorated(config.decorated));
        self.glfw
            .window_hint(glfw::WindowHint::Visible(config.visible));
        self.glfw
            .window_hint(glfw::WindowHint::Focused(config.focused));
        self.glfw
            .window_hint(glfw::WindowHint::Maximized(config.maximized));
        self.glfw
            .window_hint(glfw::WindowHint::Floating(config.floating));
        self.glfw.window_hint(glfw::WindowHint::TransparentFramebuffer(
            config.transparent,
        ));
        self.glfw
            .window_hint(glfw::WindowHint::CenterCursor(config.center_cursor));
    }
}

impl GraphicsBackend for OpenGlBackend {
    fn create_buffer(&mut self) -> BackendId {
        let mut id: GLuint = 0;
        unsafe { gl::GenBuffers(1, &mut id) };
        id
    }

    fn delete_buffer(&mut self, buffer: BackendId) {
        unsafe { gl::DeleteBuffers(1, &buffer) };
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BackendId) {
        unsafe { gl::BindBuffer(buffer_target(target), buffer) };
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            gl::BufferData(
                buffer_target(target),
                data.len() as GLsizeiptr,
                data.as_ptr().cast(),
                buffer_usage(usage),
            );
        }
    }

    fn create_vertex_array(&mut self) -> BackendId {
        let mut id: GLuint = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        id
    }

    fn delete_vertex_array(&mut self, array: BackendId) {
        unsafe { gl::DeleteVertexArrays(1, &array) };
    }

    fn bind_vertex_array(&mut self, array: BackendId) {
        unsafe { gl::BindVertexArray(array) };
    }

    fn attribute_pointer(&mut self, index: u32, components: i32, stride: i32, offset: usize) {
        unsafe {
            gl::VertexAttribPointer(
                index,
                components,
                gl::FLOAT,
                gl::FALSE,
                stride,
                offset as *const _,
            );
        }
    }

    fn enable_attribute(&mut self, index: u32) {
        unsafe { gl::EnableVertexAttribArray(index) };
    }

    fn create_program(&mut self) -> BackendId {
        unsafe { gl::CreateProgram() }
    }

    fn delete_program(&mut self, program: BackendId) {
        unsafe { gl::DeleteProgram(program) };
    }

    fn use_program(&mut self, program: BackendId) {
        unsafe { gl::UseProgram(program) };
    }

    fn compile_shader(
        &mut self,
        program: BackendId,
        stage: ShaderStage,
        source: &str,
    ) -> BackendResult<()> {
        let shader = unsafe { gl::CreateShader(shader_stage(stage)) };
        let ptr = source.as_ptr().cast::<GLchar>();
        let len = source.len() as GLint;
        unsafe {
            gl::ShaderSource(shader, 1, &ptr, &len);
            gl::CompileShader(shader);
        }

        let mut status: GLint = 0;
        unsafe { gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status) };
        if status == GLint::from(gl::FALSE) {
            let log = shader_info_log(shader);
            unsafe { gl::DeleteShader(shader) };
            return Err(BackendError::CompileOrLink(log));
        }

        unsafe {
            gl::AttachShader(program, shader);
            // Flag for deletion; freed by the driver once detached by the
            // program's own deletion.
            gl::DeleteShader(shader);
        }
        Ok(())
    }

    fn link_program(&mut self, program: BackendId) -> BackendResult<()> {
        unsafe { gl::LinkProgram(program) };
        let mut status: GLint = 0;
        unsafe { gl::GetProgramiv(program, gl::LINK_STATUS, &mut status) };
        if status == GLint::from(gl::FALSE) {
            return Err(BackendError::CompileOrLink(program_info_log(program)));
        }

        unsafe { gl::ValidateProgram(program) };
        unsafe { gl::GetProgramiv(program, gl::VALIDATE_STATUS, &mut status) };
        if status == GLint::from(gl::FALSE) {
            return Err(BackendError::CompileOrLink(program_info_log(program)));
        }
        Ok(())
    }

    fn uniform_location(&mut self, program: BackendId, name: &str) -> UniformLocation {
        let Ok(name) = CString::new(name) else {
            return -1;
        };
        unsafe { gl::GetUniformLocation(program, name.as_ptr()) }
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &[f32; 16]) {
        unsafe { gl::UniformMatrix4fv(location, 1, gl::FALSE, value.as_ptr()) };
    }

    fn clear_frame(&mut self, color: [f32; 4]) {
        unsafe {
            gl::ClearColor(color[0], color[1], color[2], color[3]);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { gl::Viewport(x, y, width, height) };
    }

    fn draw_indexed(&mut self, index_count: i32) {
        unsafe {
            gl::DrawElements(
                gl::TRIANGLES,
                index_count as GLsizei,
                gl::UNSIGNED_INT,
                std::ptr::null(),
            );
        }
    }

    fn open_window(&mut self, config: &WindowConfig) -> BackendResult<WindowId> {
        self.apply_window_hints(config);
        let (width, height) = config.effective_size();
        let title = config.title.clone();

        let created = if config.fullscreen {
            self.glfw.with_primary_monitor(|glfw, monitor| {
                let mode = monitor
                    .as_deref()
                    .map_or(glfw::WindowMode::Windowed, glfw::WindowMode::FullScreen);
                glfw.create_window(width as u32, height as u32, &title, mode)
            })
        } else {
            self.glfw
                .create_window(width as u32, height as u32, &title, glfw::WindowMode::Windowed)
        };
        let (mut window, events) = created
            .ok_or_else(|| BackendError::WindowCreation(format!("could not open {title:?}")))?;

        window.set_key_polling(true);
        window.set_size_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_mouse_button_polling(true);
        window.set_close_polling(true);

        match config.cursor_mode {
            CursorMode::Normal => {}
            CursorMode::Hidden => window.set_cursor_mode(glfw::CursorMode::Hidden),
            CursorMode::Disabled => window.set_cursor_mode(glfw::CursorMode::Disabled),
        }

        window.make_current();
        if !self.gl_loaded {
            log::info!("loading OpenGL function pointers");
            gl::load_with(|symbol| window.get_proc_address(symbol) as *const _);
            self.gl_loaded = true;
        }

        self.next_window_id += 1;
        let id = self.next_window_id;
        self.windows.insert(id, WindowSlot { window, events });
        log::info!("created GLFW window {id} ({title:?}, {width}x{height})");
        Ok(id)
    }

    fn close_window(&mut self, window: WindowId) {
        // Dropping the PWindow destroys the GLFW window and its queue.
        if self.windows.remove(&window).is_some() {
            log::info!("destroyed GLFW window {window}");
        }
    }

    fn make_current(&mut self, window: WindowId) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.window.make_current();
        }
    }

    fn should_close(&self, window: WindowId) -> bool {
        self.windows
            .get(&window)
            .map_or(true, |slot| slot.window.should_close())
    }

    fn set_should_close(&mut self, window: WindowId, value: bool) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.window.set_should_close(value);
        }
    }

    fn swap_buffers(&mut self, window: WindowId) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.window.swap_buffers();
        }
    }

    fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    fn drain_events(&mut self, window: WindowId) -> Vec<WindowEvent> {
        let Some(slot) = self.windows.get(&window) else {
            return Vec::new();
        };
        glfw::flush_messages(&slot.events)
            .filter_map(|(_, event)| translate_event(event))
            .collect()
    }

    fn window_size(&self, window: WindowId) -> (i32, i32) {
        self.windows
            .get(&window)
            .map_or((0, 0), |slot| slot.window.get_size())
    }

    fn framebuffer_size(&self, window: WindowId) -> (i32, i32) {
        self.windows
            .get(&window)
            .map_or((0, 0), |slot| slot.window.get_framebuffer_size())
    }

    fn set_window_size(&mut self, window: WindowId, width: i32, height: i32) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.window.set_size(width, height);
        }
    }

    fn window_position(&self, window: WindowId) -> (i32, i32) {
        self.windows
            .get(&window)
            .map_or((0, 0), |slot| slot.window.get_pos())
    }

    fn set_window_position(&mut self, window: WindowId, x: i32, y: i32) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.window.set_pos(x, y);
        }
    }

    fn set_window_title(&mut self, window: WindowId, title: &str) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.window.set_title(title);
        }
    }

    fn window_opacity(&self, window: WindowId) -> f32 {
        self.windows
            .get(&window)
            .map_or(0.0, |slot| slot.window.get_opacity())
    }

    fn set_window_opacity(&mut self, window: WindowId, opacity: f32) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.window.set_opacity(opacity);
        }
    }

    fn key_pressed(&self, window: WindowId, key: Key) -> bool {
        self.windows.get(&window).is_some_and(|slot| {
            slot.window.get_key(glfw_key(key)) == glfw::Action::Press
        })
    }

    fn time(&self) -> f64 {
        self.glfw.get_time()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn buffer_target(target: BufferTarget) -> GLuint {
    match target {
        BufferTarget::Vertex => gl::ARRAY_BUFFER,
        BufferTarget::Index => gl::ELEMENT_ARRAY_BUFFER,
    }
}

fn buffer_usage(usage: BufferUsage) -> GLuint {
    match usage {
        BufferUsage::StaticDraw => gl::STATIC_DRAW,
        BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
        BufferUsage::StreamDraw => gl::STREAM_DRAW,
    }
}

fn shader_stage(stage: ShaderStage) -> GLuint {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
    }
}

fn shader_info_log(shader: GLuint) -> String {
    let mut buffer = vec![0u8; INFO_LOG_CAPACITY];
    let mut length: GLsizei = 0;
    unsafe {
        gl::GetShaderInfoLog(
            shader,
            INFO_LOG_CAPACITY as GLsizei,
            &mut length,
            buffer.as_mut_ptr().cast(),
        );
    }
    buffer.truncate(length.max(0) as usize);
    String::from_utf8_lossy(&buffer).into_owned()
}

fn program_info_log(program: GLuint) -> String {
    let mut buffer = vec![0u8; INFO_LOG_CAPACITY];
    let mut length: GLsizei = 0;
    unsafe {
        gl::GetProgramInfoLog(
            program,
            INFO_LOG_CAPACITY as GLsizei,
            &mut length,
            buffer.as_mut_ptr().cast(),
        );
    }
    buffer.truncate(length.max(0) as usize);
    String::from_utf8_lossy(&buffer).into_owned()
}

fn translate_event(event: glfw::WindowEvent) -> Option<WindowEvent> {
    match event {
        glfw::WindowEvent::Size(width, height) => Some(WindowEvent::Resized { width, height }),
        glfw::WindowEvent::Key(key, _, action, _) => Some(WindowEvent::Key {
            key: Key::from_code(key as i32)?,
            action: translate_action(action),
        }),
        glfw::WindowEvent::MouseButton(button, action, _) => Some(WindowEvent::MouseButton {
            button: translate_mouse_button(button)?,
            action: translate_action(action),
        }),
        glfw::WindowEvent::CursorPos(x, y) => Some(WindowEvent::CursorMoved { x, y }),
        glfw::WindowEvent::Close => Some(WindowEvent::CloseRequested),
        _ => None,
    }
}

fn translate_action(action: glfw::Action) -> Action {
    match action {
        glfw::Action::Press => Action::Press,
        glfw::Action::Release => Action::Release,
        glfw::Action::Repeat => Action::Repeat,
    }
}

fn translate_mouse_button(button: glfw::MouseButton) -> Option<MouseButton> {
    match button {
        glfw::MouseButton::Button1 => Some(MouseButton::Left),
        glfw::MouseButton::Button2 => Some(MouseButton::Right),
        glfw::MouseButton::Button3 => Some(MouseButton::Middle),
        _ => None,
    }
}

fn glfw_key(key: Key) -> glfw::Key {
    match key {
        Key::Space => glfw::Key::Space,
        Key::A => glfw::Key::A,
        Key::B => glfw::Key::B,
        Key::C => glfw::Key::C,
        Key::D => glfw::Key::D,
        Key::E => glfw::Key::E,
        Key::F => glfw::Key::F,
        Key::G => glfw::Key::G,
        Key::H => glfw::Key::H,
        Key::I => glfw::Key::I,
        Key::J => glfw::Key::J,
        Key::K => glfw::Key::K,
        Key::L => glfw::Key::L,
        Key::M => glfw::Key::M,
        Key::N => glfw::Key::N,
        Key::O => glfw::Key::O,
        Key::P => glfw::Key::P,
        Key::Q => glfw::Key::Q,
        Key::R => glfw::Key::R,
        Key::S => glfw::Key::S,
        Key::T => glfw::Key::T,
        Key::U => glfw::Key::U,
        Key::V => glfw::Key::V,
        Key::W => glfw::Key::W,
        Key::X => glfw::Key::X,
        Key::Y => glfw::Key::Y,
        Key::Z => glfw::Key::Z,
        Key::Escape => glfw::Key::Escape,
        Key::Enter => glfw::Key::Enter,
        Key::Right => glfw::Key::Right,
        Key::Left => glfw::Key::Left,
        Key::Down => glfw::Key::Down,
        Key::Up => glfw::Key::Up,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_translation_keeps_known_keys() {
        let event = glfw::WindowEvent::Key(glfw::Key::W, 0, glfw::Action::Press, glfw::Modifiers::empty());
        assert_eq!(
            translate_event(event),
            Some(WindowEvent::Key {
                key: Key::W,
                action: Action::Press,
            })
        );
    }

    #[test]
    fn test_unmapped_events_are_dropped() {
        assert_eq!(translate_event(glfw::WindowEvent::Refresh), None);
        let unknown = glfw::WindowEvent::Key(
            glfw::Key::F24,
            0,
            glfw::Action::Press,
            glfw::Modifiers::empty(),
        );
        assert_eq!(translate_event(unknown), None);
    }

    #[test]
    fn test_size_event_becomes_resize() {
        assert_eq!(
            translate_event(glfw::WindowEvent::Size(640, 480)),
            Some(WindowEvent::Resized {
                width: 640,
                height: 480,
            })
        );
    }
}
