//! Look-at camera driven by arrow keys and right-button drags.

use meshpick_math::{Point3, Transform, Vec3};

use crate::config::CameraConfig;
use crate::input::Key;

/// Camera looking from `position` at a fixed `target`, kept upright
/// relative to +Y.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Point3,
    target: Point3,
    view_direction: Vec3,
    right: Vec3,
    up: Vec3,
    view: Transform,
    speed: f64,
    key_step: f64,
    rotate_sensitivity: f64,
}

impl Camera {
    /// Camera at `position` looking at `target` with default controls.
    pub fn new(position: Point3, target: Point3) -> Self {
        let defaults = CameraConfig::default();
        let mut camera = Self {
            position,
            target,
            view_direction: -Vec3::z(),
            right: Vec3::x(),
            up: Vec3::y(),
            view: Transform::identity(),
            speed: defaults.speed,
            key_step: defaults.key_step,
            rotate_sensitivity: defaults.rotate_sensitivity,
        };
        camera.update_vectors();
        camera
    }

    /// Camera placed and tuned from configuration.
    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self::new(Point3::from(config.position), Point3::from(config.target));
        camera.speed = config.speed;
        camera.key_step = config.key_step;
        camera.rotate_sensitivity = config.rotate_sensitivity;
        camera
    }

    /// Rebuild the basis and view matrix after the eye moved.
    ///
    /// When the eye is straight above or below the target the previous
    /// right vector is kept.
    fn update_vectors(&mut self) {
        if let Some(dir) = (self.target - self.position).try_normalize(f64::EPSILON) {
            self.view_direction = dir;
        }
        if let Some(right) = Vec3::y().cross(&self.view_direction).try_normalize(f64::EPSILON) {
            self.right = right;
        }
        self.up = self.view_direction.cross(&self.right).normalize();
        self.view = Transform::look_at(&self.position, &self.target, &self.up);
    }

    /// Apply a key press. Returns whether the camera moved.
    pub fn handle_key(&mut self, key: Key) -> bool {
        let step = self.speed * self.key_step;
        match key {
            Key::Up => self.position += self.view_direction * step,
            Key::Down => self.position -= self.view_direction * step,
            Key::Right => self.position += self.right * step,
            Key::Left => self.position -= self.right * step,
            Key::X => self.position = Point3::new(4.0, 0.0, 0.0),
            Key::Y => self.position = Point3::new(0.76, 4.0, 0.0),
            Key::Z => self.position = Point3::new(0.0, 0.0, 4.0),
            Key::Q | Key::Other => return false,
        }
        self.update_vectors();
        true
    }

    /// Orbit the eye around the target by a drag of `(dx, dy)` pixels:
    /// first about +Y, then about +X.
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        let yaw = Transform::rotation_y((-dx * self.rotate_sensitivity).to_radians());
        let pitch = Transform::rotation_x((-dy * self.rotate_sensitivity).to_radians());
        let offset = pitch.then(&yaw).apply_vec(&(self.position - self.target));
        self.position = self.target + offset;
        self.update_vectors();
    }

    /// World-to-view matrix.
    pub fn view_matrix(&self) -> &Transform {
        &self.view
    }

    /// Eye position.
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// Unit vector from the eye towards the target.
    pub fn view_direction(&self) -> Vec3 {
        self.view_direction
    }

    /// Unit right vector, `+Y x view_direction`.
    pub fn right(&self) -> Vec3 {
        self.right
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}
