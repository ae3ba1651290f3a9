use std::f32::consts::{PI, TAU};

use glam::Vec3;
use winit::event::MouseButton;

use crate::engine::camera::PerspectiveCamera;
use crate::engine::user_input::InputState;

const MIN_POLAR: f32 = 1e-4;

/// Drag-to-orbit, wheel-to-zoom camera controller around a fixed target.
///
/// Input only accumulates deltas; `update` applies them to the camera. With damping enabled
/// each update applies a fraction of the outstanding delta, so motion eases out over
/// several frames.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    radius: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,

    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitControls {
    pub fn new(camera: &PerspectiveCamera, target: Vec3) -> Self {
        let offset = camera.transform.translation - target;
        let radius = offset.length().max(f32::EPSILON);
        Self {
            target,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    pub fn with_damping(mut self, enabled: bool) -> Self {
        self.enable_damping = enabled;
        self
    }

    #[cfg(test)]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Drag by `(dx, dy)` pixels; a drag across the full viewport height is one turn.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        self.delta_theta -= TAU * dx / viewport_height * self.rotate_speed;
        self.delta_phi -= TAU * dy / viewport_height * self.rotate_speed;
    }

    /// Positive `lines` moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.scale *= 0.95f32.powf(lines * self.zoom_speed);
    }

    pub fn handle_input(&mut self, input: &InputState) {
        if input.button_down(MouseButton::Left) {
            let (dx, dy) = input.mouse_movement();
            self.rotate(dx, dy, input.viewport.1 as f32);
        }
        if input.wheel_delta.1 != 0.0 {
            self.zoom(input.wheel_delta.1);
        }
    }

    /// Apply pending motion to `camera`. Call once per frame.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let f = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        self.theta += self.delta_theta * f;
        self.phi = (self.phi + self.delta_phi * f).clamp(MIN_POLAR, PI - MIN_POLAR);
        self.radius = (self.radius * self.scale).clamp(self.min_distance, self.max_distance);

        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        let offset = Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta) * self.radius;

        camera.transform.translation = self.target + offset;
        camera.look_at(self.target);

        if self.enable_damping {
            self.delta_theta *= 1.0 - f;
            self.delta_phi *= 1.0 - f;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;
    }
}
