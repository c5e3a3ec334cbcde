//! Headless allocate-and-record backend
//!
//! Implements the full [`GraphicsBackend`] contract without a GPU or a
//! window system: ids are handed out from a monotonic counter and every
//! state-changing call is recorded. Drives the test suite and works for
//! headless runs of application code.
//!
//! Tests reach the recorder through `as_any` downcasting and the inspection
//! methods (`buffer_alive`, `upload_len`, ...), and script input with
//! [`HeadlessBackend::push_event`] and
//! [`HeadlessBackend::close_after_polls`].

use crate::backend::{
    BackendError, BackendId, BackendResult, BufferTarget, BufferUsage, GraphicsBackend,
    ShaderStage, UniformLocation, WindowEvent, WindowId,
};
use crate::config::WindowConfig;
use crate::input::{Action, Key};
use std::collections::{HashMap, HashSet};

struct HeadlessWindow {
    title: String,
    size: (i32, i32),
    position: (i32, i32),
    opacity: f32,
    should_close: bool,
    close_in_polls: Option<u32>,
    pending_events: Vec<WindowEvent>,
    pressed_keys: HashSet<Key>,
}

/// In-memory recording backend.
#[derive(Default)]
pub struct HeadlessBackend {
    next_id: BackendId,

    buffers: HashSet<BackendId>,
    vertex_arrays: HashSet<BackendId>,
    programs: HashSet<BackendId>,
    windows: HashMap<WindowId, HeadlessWindow>,

    bound_buffers: HashMap<BufferTarget, BackendId>,
    bound_vertex_array: BackendId,
    active_program: BackendId,
    current_window: WindowId,

    uploads: HashMap<BackendId, usize>,
    enabled_attributes: HashSet<u32>,
    uniform_locations: HashMap<(BackendId, String), UniformLocation>,
    next_uniform_location: HashMap<BackendId, UniformLocation>,

    fail_compile_with: Option<String>,
    fail_link_with: Option<String>,

    clock: f64,
    draw_calls: usize,
    last_viewport: (i32, i32, i32, i32),
}

impl HeadlessBackend {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> BackendId {
        self.next_id += 1;
        self.next_id
    }

    // Test scripting

    /// Queue an event for `window`, delivered on the next drain. Key events
    /// also update the window's held-key set, and resize events its stored
    /// size, mirroring what a real window system would have done by the
    /// time the event is observed.
    pub fn push_event(&mut self, window: WindowId, event: WindowEvent) {
        if let Some(slot) = self.windows.get_mut(&window) {
            match &event {
                WindowEvent::Key { key, action } => match action {
                    Action::Press => {
                        slot.pressed_keys.insert(*key);
                    }
                    Action::Release => {
                        slot.pressed_keys.remove(key);
                    }
                    Action::Repeat => {}
                },
                WindowEvent::Resized { width, height } => {
                    slot.size = (*width, *height);
                }
                _ => {}
            }
            slot.pending_events.push(event);
        }
    }

    /// Raise the window's close flag after the given number of polls.
    pub fn close_after_polls(&mut self, window: WindowId, polls: u32) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.close_in_polls = Some(polls);
        }
    }

    /// Fail the next shader compilation with `log` as the error text.
    pub fn fail_next_compile(&mut self, log: &str) {
        self.fail_compile_with = Some(log.to_string());
    }

    /// Fail the next program link with `log` as the error text.
    pub fn fail_next_link(&mut self, log: &str) {
        self.fail_link_with = Some(log.to_string());
    }

    // Inspection

    /// Whether a buffer id is currently allocated.
    pub fn buffer_alive(&self, id: BackendId) -> bool {
        self.buffers.contains(&id)
    }

    /// Whether a vertex array id is currently allocated.
    pub fn vertex_array_alive(&self, id: BackendId) -> bool {
        self.vertex_arrays.contains(&id)
    }

    /// Whether a window id is currently open.
    pub fn window_alive(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    /// Number of live program objects.
    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    /// Byte length of the last upload into the given buffer.
    pub fn upload_len(&self, id: BackendId) -> Option<usize> {
        self.uploads.get(&id).copied()
    }

    /// The currently bound vertex array (0 when none).
    pub fn bound_vertex_array(&self) -> BackendId {
        self.bound_vertex_array
    }

    /// The buffer currently bound to `target` (0 when none).
    pub fn bound_buffer(&self, target: BufferTarget) -> BackendId {
        self.bound_buffers.get(&target).copied().unwrap_or(0)
    }

    /// Whether a vertex attribute slot was enabled.
    pub fn attribute_enabled(&self, index: u32) -> bool {
        self.enabled_attributes.contains(&index)
    }

    /// The program made current by the last `use_program` (0 when none).
    pub fn active_program(&self) -> BackendId {
        self.active_program
    }

    /// The window whose context is current (0 when none).
    pub fn current_window(&self) -> WindowId {
        self.current_window
    }

    /// Number of draw calls issued so far.
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    /// The most recent viewport rectangle.
    pub fn last_viewport(&self) -> (i32, i32, i32, i32) {
        self.last_viewport
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn create_buffer(&mut self) -> BackendId {
        let id = self.allocate();
        self.buffers.insert(id);
        id
    }

    fn delete_buffer(&mut self, buffer: BackendId) {
        self.buffers.remove(&buffer);
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BackendId) {
        self.bound_buffers.insert(target, buffer);
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], _usage: BufferUsage) {
        let bound = self.bound_buffer(target);
        if bound != 0 {
            self.uploads.insert(bound, data.len());
        }
    }

    fn create_vertex_array(&mut self) -> BackendId {
        let id = self.allocate();
        self.vertex_arrays.insert(id);
        id
    }

    fn delete_vertex_array(&mut self, array: BackendId) {
        self.vertex_arrays.remove(&array);
    }

    fn bind_vertex_array(&mut self, array: BackendId) {
        self.bound_vertex_array = array;
    }

    fn attribute_pointer(&mut self, _index: u32, _components: i32, _stride: i32, _offset: usize) {}

    fn enable_attribute(&mut self, index: u32) {
        self.enabled_attributes.insert(index);
    }

    fn create_program(&mut self) -> BackendId {
        let id = self.allocate();
        self.programs.insert(id);
        id
    }

    fn delete_program(&mut self, program: BackendId) {
        self.programs.remove(&program);
    }

    fn use_program(&mut self, program: BackendId) {
        self.active_program = program;
    }

    fn compile_shader(
        &mut self,
        _program: BackendId,
        _stage: ShaderStage,
        _source: &str,
    ) -> BackendResult<()> {
        match self.fail_compile_with.take() {
            Some(log) => Err(BackendError::CompileOrLink(log)),
            None => Ok(()),
        }
    }

    fn link_program(&mut self, _program: BackendId) -> BackendResult<()> {
        match self.fail_link_with.take() {
            Some(log) => Err(BackendError::CompileOrLink(log)),
            None => Ok(()),
        }
    }

    fn uniform_location(&mut self, program: BackendId, name: &str) -> UniformLocation {
        let key = (program, name.to_string());
        if let Some(&location) = self.uniform_locations.get(&key) {
            return location;
        }
        let next = self.next_uniform_location.entry(program).or_insert(0);
        let location = *next;
        *next += 1;
        self.uniform_locations.insert(key, location);
        location
    }

    fn set_uniform_mat4(&mut self, _location: UniformLocation, _value: &[f32; 16]) {}

    fn clear_frame(&mut self, _color: [f32; 4]) {}

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.last_viewport = (x, y, width, height);
    }

    fn draw_indexed(&mut self, _index_count: i32) {
        self.draw_calls += 1;
    }

    fn open_window(&mut self, config: &WindowConfig) -> BackendResult<WindowId> {
        let id = self.allocate();
        self.windows.insert(
            id,
            HeadlessWindow {
                title: config.title.clone(),
                size: config.effective_size(),
                position: (0, 0),
                opacity: 1.0,
                should_close: false,
                close_in_polls: None,
                pending_events: Vec::new(),
                pressed_keys: HashSet::new(),
            },
        );
        self.current_window = id;
        Ok(id)
    }

    fn close_window(&mut self, window: WindowId) {
        self.windows.remove(&window);
    }

    fn make_current(&mut self, window: WindowId) {
        self.current_window = window;
    }

    fn should_close(&self, window: WindowId) -> bool {
        self.windows.get(&window).map_or(true, |w| w.should_close)
    }

    fn set_should_close(&mut self, window: WindowId, value: bool) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.should_close = value;
        }
    }

    fn swap_buffers(&mut self, _window: WindowId) {}

    fn poll_events(&mut self) {
        self.clock += 1.0 / 60.0;
        for slot in self.windows.values_mut() {
            if let Some(remaining) = slot.close_in_polls {
                if remaining <= 1 {
                    slot.should_close = true;
                    slot.close_in_polls = None;
                } else {
                    slot.close_in_polls = Some(remaining - 1);
                }
            }
        }
    }

    fn drain_events(&mut self, window: WindowId) -> Vec<WindowEvent> {
        self.windows
            .get_mut(&window)
            .map(|w| std::mem::take(&mut w.pending_events))
            .unwrap_or_default()
    }

    fn window_size(&self, window: WindowId) -> (i32, i32) {
        self.windows.get(&window).map_or((0, 0), |w| w.size)
    }

    fn framebuffer_size(&self, window: WindowId) -> (i32, i32) {
        self.window_size(window)
    }

    fn set_window_size(&mut self, window: WindowId, width: i32, height: i32) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.size = (width, height);
        }
    }

    fn window_position(&self, window: WindowId) -> (i32, i32) {
        self.windows.get(&window).map_or((0, 0), |w| w.position)
    }

    fn set_window_position(&mut self, window: WindowId, x: i32, y: i32) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.position = (x, y);
        }
    }

    fn set_window_title(&mut self, window: WindowId, title: &str) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.title = title.to_string();
        }
    }

    fn window_opacity(&self, window: WindowId) -> f32 {
        self.windows.get(&window).map_or(0.0, |w| w.opacity)
    }

    fn set_window_opacity(&mut self, window: WindowId, opacity: f32) {
        if let Some(slot) = self.windows.get_mut(&window) {
            slot.opacity = opacity;
        }
    }

    fn key_pressed(&self, window: WindowId, key: Key) -> bool {
        self.windows
            .get(&window)
            .is_some_and(|w| w.pressed_keys.contains(&key))
    }

    fn time(&self) -> f64 {
        self.clock
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_non_zero_and_unique() {
        let mut backend = HeadlessBackend::new();
        let a = backend.create_buffer();
        let b = backend.create_vertex_array();
        let c = backend.create_program();
        assert!(a != 0 && b != 0 && c != 0);
        assert!(a != b && b != c && a != c);
    }

    #[test]
    fn test_upload_targets_bound_buffer() {
        let mut backend = HeadlessBackend::new();
        let buffer = backend.create_buffer();
        backend.bind_buffer(BufferTarget::Vertex, buffer);
        backend.buffer_data(BufferTarget::Vertex, &[0u8; 24], BufferUsage::StaticDraw);
        assert_eq!(backend.upload_len(buffer), Some(24));
    }

    #[test]
    fn test_unknown_window_reports_closed() {
        let backend = HeadlessBackend::new();
        assert!(backend.should_close(42));
        assert_eq!(backend.window_size(42), (0, 0));
    }

    #[test]
    fn test_clock_advances_with_polling() {
        let mut backend = HeadlessBackend::new();
        let before = backend.time();
        backend.poll_events();
        assert!(backend.time() > before);
    }

    #[test]
    fn test_window_title_round_trip() {
        let mut backend = HeadlessBackend::new();
        let id = backend.open_window(&WindowConfig::new("first")).expect("open");
        backend.set_window_title(id, "renamed");
        let slot = backend.windows.get(&id).expect("window");
        assert_eq!(slot.title, "renamed");
    }
}
