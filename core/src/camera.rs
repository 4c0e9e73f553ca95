//! Free-fly camera model.
//!
//! Yaw/pitch are stored in degrees. Yaw -90 looks down -Z. The basis
//! (`front`, `right`, `up`) is recomputed after every orientation change and
//! stays orthonormal and right-handed.

use crate::math::{Mat4, Vec3, look_at_rh, perspective_rh};

/// Minimum field of view in degrees.
pub const MIN_FOV: f32 = 1.0;
/// Maximum field of view in degrees.
pub const MAX_FOV: f32 = 45.0;
/// Pitch limit applied when pitch is constrained.
pub const PITCH_LIMIT: f32 = 89.0;

/// Direction of a keyboard movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// First-person camera flying freely through the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyCamera {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    /// Horizontal angle in degrees.
    yaw: f32,
    /// Vertical angle in degrees.
    pitch: f32,
    /// Movement speed (units per second).
    speed: f32,
    /// Look sensitivity (degrees per cursor unit).
    sensitivity: f32,
    /// Vertical field of view in degrees.
    fov: f32,
}

impl FlyCamera {
    /// Create a camera at `position` looking down -Z with +Y as world up.
    pub fn new(position: Vec3) -> Self {
        Self::with_orientation(position, Vec3::y(), -90.0, 0.0)
    }

    /// Create a camera with an explicit world up and initial yaw/pitch (degrees).
    pub fn with_orientation(position: Vec3, world_up: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            front: -Vec3::z(),
            up: Vec3::y(),
            right: Vec3::x(),
            world_up,
            yaw,
            pitch,
            speed: 2.5,
            sensitivity: 0.1,
            fov: MAX_FOV,
        };
        camera.update_basis();
        camera
    }

    /// Set the movement speed (units per second).
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set the look sensitivity (degrees per cursor unit).
    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Set the field of view (degrees), clamped to `[MIN_FOV, MAX_FOV]`.
    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov.clamp(MIN_FOV, MAX_FOV);
        self
    }

    /// Translate along the camera basis by `speed * dt`.
    pub fn process_movement(&mut self, direction: CameraMovement, dt: f32) {
        let velocity = self.speed * dt;
        match direction {
            CameraMovement::Forward => self.position += self.front * velocity,
            CameraMovement::Backward => self.position -= self.front * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
    }

    /// Rotate by cursor deltas scaled by the sensitivity.
    ///
    /// With `constrain_pitch` the pitch is clamped to ±[`PITCH_LIMIT`].
    pub fn process_look(&mut self, dx: f32, dy: f32, constrain_pitch: bool) {
        self.yaw += dx * self.sensitivity;
        self.pitch += dy * self.sensitivity;
        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.update_basis();
    }

    /// Constrained [`process_look`](Self::process_look).
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.process_look(dx, dy, true);
    }

    /// Narrow (positive `dy`) or widen the field of view.
    pub fn process_zoom(&mut self, dy: f32) {
        self.fov = (self.fov - dy).clamp(MIN_FOV, MAX_FOV);
    }

    /// Right-handed view matrix looking from the position along `front`.
    pub fn view_matrix(&self) -> Mat4 {
        look_at_rh(&self.position, &(self.position + self.front), &self.up)
    }

    /// Perspective projection using the current field of view.
    pub fn projection_matrix(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        perspective_rh(self.fov.to_radians(), aspect, near, far)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn world_up(&self) -> Vec3 {
        self.world_up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Vertical field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    fn update_basis(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(&self.world_up).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 10.0))
    }
}
