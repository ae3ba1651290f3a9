use glam::{Mat4, Vec3};

use crate::engine::scene::Transform;

/// Right-handed perspective camera looking down its local -Z.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub transform: Transform,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(70.0, 4.0 / 3.0, 0.01, 20.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y_degrees,
            aspect,
            near,
            far,
            transform: Transform::default(),
        }
    }

    /// Follow a window resize. Zero-sized (minimized) windows keep the old aspect.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn look_at(&mut self, target: Vec3) {
        let eye = self.transform.translation;
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        self.transform.rotation = glam::Quat::from_mat4(&view.inverse());
    }

    /// Vulkan-style `[0, 1]` depth projection.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view(&self) -> Mat4 {
        self.transform.matrix().inverse()
    }
}
