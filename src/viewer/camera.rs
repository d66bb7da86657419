//! Damped orbit camera.

use glam::{Mat4, Vec3};

const ROTATE_SPEED: f32 = 0.005;
const ZOOM_SPEED: f32 = 0.1;
const MIN_DISTANCE: f32 = 0.3;
const MAX_DISTANCE: f32 = 20.0;
const PITCH_LIMIT: f32 = 1.5;

/// Orbit camera around the origin with inertial rotation.
///
/// Input adds angular velocity; [`update`](Camera::update) spends it over
/// several frames according to `damping`.
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Fraction of pending motion applied (and removed) per update.
    pub damping: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
}

impl Camera {
    /// Camera at `position` looking at the origin.
    pub fn from_position(position: Vec3, damping: f32) -> Self {
        let distance = position.length().max(MIN_DISTANCE);
        let pitch = (position.y / distance).clamp(-1.0, 1.0).asin();
        let yaw = position.x.atan2(position.z);
        Self {
            yaw,
            pitch,
            distance,
            target: Vec3::ZERO,
            damping: damping.clamp(0.0, 1.0),
            fov_y: 50.0_f32.to_radians(),
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Mouse drag by `(dx, dy)` pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.yaw_velocity -= dx * ROTATE_SPEED;
        self.pitch_velocity += dy * ROTATE_SPEED;
    }

    /// Scroll by `lines`; positive zooms in.
    pub fn zoom(&mut self, lines: f32) {
        self.distance = (self.distance * (1.0 - lines * ZOOM_SPEED)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Apply pending rotation. Call once per frame.
    pub fn update(&mut self) {
        let share = if self.damping > 0.0 { self.damping } else { 1.0 };

        self.yaw += self.yaw_velocity * share;
        self.pitch = (self.pitch + self.pitch_velocity * share).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        self.yaw_velocity *= 1.0 - share;
        self.pitch_velocity *= 1.0 - share;
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Combined projection and view for the given aspect ratio.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov_y, aspect, 0.01, 100.0);
        proj * self.view_matrix()
    }
}
