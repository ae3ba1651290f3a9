use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Light sources the demos place in their scenes.
///
/// Colors are linear RGB in `[0, 1]`. Positional data lives on the owning node's transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient {
        color: Vec3,
        intensity: f32,
    },
    Hemisphere {
        sky: Vec3,
        ground: Vec3,
        intensity: f32,
    },
    Directional {
        color: Vec3,
        intensity: f32,
    },
    Point {
        color: Vec3,
        intensity: f32,
        /// Cutoff range; `0.0` means unlimited.
        distance: f32,
    },
}

impl Light {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Light::Ambient { .. } => "ambient_light",
            Light::Hemisphere { .. } => "hemisphere_light",
            Light::Directional { .. } => "directional_light",
            Light::Point { .. } => "point_light",
        }
    }
}
