//! Fly camera
//!
//! Yaw/pitch camera with WASD movement and cursor-delta turning, producing
//! a right-handed view matrix. CPU-side only; it has no backend object and
//! lives in the camera registry purely for naming and lifetime.

use crate::backend::BackendId;
use crate::input::{Key, KeyState};
use crate::resources::{Resource, ResourceKind};
use nalgebra::{Matrix4, Point3, Vector3};

const FRONT_KEY: Key = Key::W;
const BACK_KEY: Key = Key::S;
const LEFT_KEY: Key = Key::A;
const RIGHT_KEY: Key = Key::D;

/// Pitch is clamped to keep the camera from flipping over.
const PITCH_LIMIT: f32 = 89.0;

/// A free-flying camera.
pub struct Camera {
    position: Vector3<f32>,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    world_up: Vector3<f32>,

    yaw: f32,
    pitch: f32,

    move_speed: f32,
    turn_speed: f32,
}

impl Camera {
    /// Create a camera at `position` with the given orientation and speeds.
    ///
    /// `yaw` and `pitch` are in degrees; `move_speed` is world units per
    /// second, `turn_speed` degrees per cursor unit.
    pub fn new(
        position: Vector3<f32>,
        world_up: Vector3<f32>,
        yaw: f32,
        pitch: f32,
        move_speed: f32,
        turn_speed: f32,
    ) -> Self {
        let mut camera = Self {
            position,
            front: Vector3::x(),
            right: Vector3::x(),
            up: Vector3::y(),
            world_up,
            yaw,
            pitch,
            move_speed,
            turn_speed,
        };
        camera.update_vectors();
        camera
    }

    /// Current camera position.
    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// Current view direction.
    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    /// The view matrix for the current position and orientation.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            &Point3::from(self.position),
            &Point3::from(self.position + self.front),
            &self.up,
        )
    }

    /// Move the camera based on the currently held movement keys.
    pub fn on_keys(&mut self, keys: &KeyState, delta_time: f32) {
        let velocity = self.move_speed * delta_time;
        if keys.is_pressed(FRONT_KEY) {
            self.position += self.front * velocity;
        }
        if keys.is_pressed(BACK_KEY) {
            self.position -= self.front * velocity;
        }
        if keys.is_pressed(LEFT_KEY) {
            self.position -= self.right * velocity;
        }
        if keys.is_pressed(RIGHT_KEY) {
            self.position += self.right * velocity;
        }
    }

    /// Turn the camera by a cursor delta.
    pub fn on_cursor_moved(&mut self, x_delta: f32, y_delta: f32) {
        self.yaw += x_delta * self.turn_speed;
        self.pitch += y_delta * self.turn_speed;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Recompute front/right/up from yaw, pitch and world up.
    fn update_vectors(&mut self) {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        self.front = Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(&self.world_up).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }
}

impl Resource for Camera {
    const KIND: ResourceKind = ResourceKind::Camera;

    fn backend_id(&self) -> Option<BackendId> {
        None
    }

    fn disown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_camera() -> Camera {
        Camera::new(Vector3::zeros(), Vector3::y(), -90.0, 0.0, 2.0, 1.0)
    }

    #[test]
    fn test_yaw_minus_ninety_looks_down_negative_z() {
        let camera = test_camera();
        assert_relative_eq!(camera.front().x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.front().y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.front().z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = test_camera();
        camera.on_cursor_moved(0.0, 10_000.0);
        assert_relative_eq!(camera.front().y, PITCH_LIMIT.to_radians().sin(), epsilon = 1e-5);
        camera.on_cursor_moved(0.0, -20_000.0);
        assert_relative_eq!(
            camera.front().y,
            (-PITCH_LIMIT).to_radians().sin(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_movement_follows_front_vector() {
        let mut camera = test_camera();
        let mut keys = crate::input::KeyState::default();
        keys.set(Key::W, true);
        camera.on_keys(&keys, 0.5);
        assert_relative_eq!(camera.position().z, -1.0, epsilon = 1e-6);
        keys.set(Key::W, false);
        keys.set(Key::D, true);
        camera.on_keys(&keys, 0.5);
        assert_relative_eq!(camera.position().x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_basis_stays_orthonormal_after_turning() {
        let mut camera = test_camera();
        camera.on_cursor_moved(37.0, 11.0);
        assert_relative_eq!(camera.front().norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(camera.front().dot(&camera.right), 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.front().dot(&camera.up), 0.0, epsilon = 1e-6);
    }
}
