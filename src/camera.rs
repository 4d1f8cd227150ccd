//! Orbit camera; the renderer only needs its view-projection matrix.

use glam::{Mat4, Vec3};

/// Anything that can produce a column-major view-projection matrix.
pub trait ViewProjection {
    fn view_projection(&self, aspect: f32) -> Mat4;
}

/// Orbit camera for viewing the particle fountain.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    const ORBIT_SPEED: f32 = 0.005;
    const ZOOM_SPEED: f32 = 0.3;
    const PITCH_LIMIT: f32 = 1.5;
    const MIN_DISTANCE: f32 = 0.5;
    const MAX_DISTANCE: f32 = 20.0;

    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.3,
            distance: 4.0,
            target: Vec3::new(0.0, -0.5, 0.0),
            fov_y: 45.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Rotate by a mouse drag of `(dx, dy)` pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * Self::ORBIT_SPEED;
        self.pitch = (self.pitch + dy * Self::ORBIT_SPEED).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Move closer (positive `scroll`) or further away.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance =
            (self.distance - scroll * Self::ZOOM_SPEED).clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewProjection for OrbitCamera {
    fn view_projection(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far);
        proj * self.view_matrix()
    }
}
