//! Tetrahedron demo
//!
//! Opens a window, renders a spinning tetrahedron and flies a camera with
//! WASD + mouse. Escape closes the window and ends the application.

use gl_kit::prelude::*;
use nalgebra::{Matrix4, Perspective3, Vector3};
use std::cell::RefCell;
use std::rc::Rc;

const VERTEX_SHADER: &str = r"#version 330 core
layout (location = 0) in vec3 position;

uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;

out vec4 vertex_color;

void main() {
    gl_Position = projection * view * model * vec4(position, 1.0);
    vertex_color = vec4(clamp(position, 0.0, 1.0), 1.0);
}
";

const FRAGMENT_SHADER: &str = r"#version 330 core
in vec4 vertex_color;
out vec4 color;

void main() {
    color = vertex_color;
}
";

// A tetrahedron: three base corners on the x-y plane, apex above the origin.
const VERTICES: [f32; 12] = [
    -1.0, -1.0, 0.0, //
    1.0, -1.0, 0.0, //
    0.0, 1.0, 0.0, //
    0.0, 0.0, 1.0,
];
const INDICES: [u32; 12] = [0, 1, 2, 0, 2, 3, 0, 3, 1, 1, 3, 2];

struct TetraDemo;

impl Lifecycle for TetraDemo {
    fn startup(&mut self, app: &mut App) -> AppResult<()> {
        log::info!("building demo resources");
        let ctx = app.context().clone();

        let mesh = Mesh::from_data(&ctx, &VERTICES, &INDICES);
        let shader = ShaderProgram::from_sources(&ctx, VERTEX_SHADER, FRAGMENT_SHADER)
            .map_err(|e| AppError::Custom(e.to_string()))?;

        let camera = Rc::new(RefCell::new(Camera::new(
            Vector3::new(0.0, 0.0, 4.0),
            Vector3::y(),
            -90.0,
            0.0,
            4.0,
            0.1,
        )));

        let window = app.current_window()?;

        let flown = camera.clone();
        window.set_logic_callback(move |window, delta_time| {
            let mut camera = flown.borrow_mut();
            camera.on_keys(window.key_state(), delta_time as f32);
            let (dx, dy) = window.cursor_delta();
            camera.on_cursor_moved(dx as f32, dy as f32);
        });

        let mut angle = 0.0f32;
        window.set_render_callback(move |window, delta_time| {
            angle += delta_time as f32;

            let (width, height) = window.viewport_size();
            let aspect = if height > 0 {
                width as f32 / height as f32
            } else {
                1.0
            };
            let projection =
                Perspective3::new(aspect, 45.0f32.to_radians(), 0.1, 100.0).to_homogeneous();
            let model = Matrix4::new_rotation(Vector3::y() * angle);

            shader.bind();
            shader.set_model(&model);
            shader.set_view(&camera.borrow().view_matrix());
            shader.set_projection(&projection);
            mesh.render();
            shader.unbind();
        });

        Ok(())
    }

    fn shutdown(&mut self, _app: &mut App) {
        log::info!("demo finished");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    gl_kit::logging::init();

    let backend = OpenGlBackend::new()?;
    let config = WindowConfig::new("Tetrahedron")
        .with_size(1024, 768)
        .with_cursor_mode(CursorMode::Disabled);
    let mut app = App::new(Box::new(backend), config)?;
    app.run(&mut TetraDemo)?;
    Ok(())
}
