use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local TRS transform of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    #[cfg(test)]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// Decompose an affine matrix. Shear is dropped.
    #[cfg(test)]
    pub fn from_matrix(m: Mat4) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn set_uniform_scale(&mut self, s: f32) {
        self.scale = Vec3::splat(s);
    }

    /// Set rotation from intrinsic XYZ Euler angles (radians).
    pub fn set_euler_xyz(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn matrix_round_trips_through_decomposition() {
        let t = Transform {
            translation: Vec3::new(1.0, -2.0, 0.5),
            rotation: Quat::from_rotation_y(0.7),
            scale: Vec3::splat(0.01),
        };

        let back = Transform::from_matrix(t.matrix());

        assert!(back.translation.abs_diff_eq(t.translation, 1e-5));
        assert!(back.rotation.abs_diff_eq(t.rotation, 1e-5));
        assert_relative_eq!(back.scale.x, 0.01, epsilon = 1e-6);
    }

    #[test]
    fn euler_xyz_matches_single_axis_rotation() {
        let mut t = Transform::default();
        t.set_euler_xyz(0.0, std::f32::consts::FRAC_PI_2, 0.0);

        let rotated = t.rotation * Vec3::X;
        assert!(rotated.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
    }
}
