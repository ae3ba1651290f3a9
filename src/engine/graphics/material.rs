use glam::Vec3;

use crate::engine::graphics::TextureHandle;

/// `0xRRGGBB` to linear-ish RGB in `[0, 1]` (no gamma conversion).
pub fn hex_color(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Unlit.
    Basic,
    /// Metal/roughness PBR.
    Standard,
    /// Standard plus clearcoat, reflectivity and transmission.
    Physical,
}

/// Six cube faces in +X, -X, +Y, -Y, +Z, -Z order.
///
/// Owned by the scene, not by the materials that sample it: disposing a material leaves the
/// faces alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentMap {
    pub faces: [TextureHandle; 6],
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaterialMaps {
    pub base_color: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub roughness: Option<TextureHandle>,
    pub emissive: Option<TextureHandle>,
    pub environment: Option<EnvironmentMap>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,

    pub color: Vec3,
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: Vec3,
    pub emissive_intensity: f32,

    pub opacity: f32,
    pub transparent: bool,
    pub double_sided: bool,
    pub flat_shading: bool,

    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub reflectivity: f32,
    pub transmission: f32,

    pub maps: MaterialMaps,
}

impl Material {
    pub fn new(name: impl Into<String>, kind: MaterialKind) -> Self {
        Self {
            name: name.into(),
            kind,
            color: Vec3::ONE,
            metalness: 0.0,
            roughness: 1.0,
            emissive: Vec3::ZERO,
            emissive_intensity: 1.0,
            opacity: 1.0,
            transparent: false,
            double_sided: false,
            flat_shading: false,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            reflectivity: 0.5,
            transmission: 0.0,
            maps: MaterialMaps::default(),
        }
    }

    pub fn basic(name: impl Into<String>) -> Self {
        Self::new(name, MaterialKind::Basic)
    }

    pub fn standard(name: impl Into<String>) -> Self {
        Self::new(name, MaterialKind::Standard)
    }

    pub fn physical(name: impl Into<String>) -> Self {
        Self::new(name, MaterialKind::Physical)
    }

    /// Plain white unlit marker material.
    pub fn reticle() -> Self {
        Self::basic("reticle")
    }

    /// Bright mirror-like chrome applied to placed models.
    pub fn chrome(environment: Option<EnvironmentMap>) -> Self {
        Self {
            metalness: 1.0,
            roughness: 0.02,
            reflectivity: 1.0,
            clearcoat: 1.0,
            clearcoat_roughness: 0.01,
            maps: MaterialMaps {
                environment,
                ..MaterialMaps::default()
            },
            ..Self::physical("chrome")
        }
    }

    /// Fully metallic, texture-driven material with a white emissive tint (the map decides
    /// what actually glows).
    pub fn textured(maps: MaterialMaps) -> Self {
        Self {
            metalness: 1.0,
            roughness: 1.0,
            emissive: Vec3::ONE,
            maps,
            ..Self::standard("textured")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_splits_channels() {
        let c = hex_color(0xff69b4);
        assert!(c.abs_diff_eq(Vec3::new(1.0, 105.0 / 255.0, 180.0 / 255.0), 1e-6));
    }

    #[test]
    fn chrome_is_fully_metallic_and_keeps_environment() {
        let chrome = Material::chrome(None);
        assert_eq!(chrome.kind, MaterialKind::Physical);
        assert_eq!(chrome.metalness, 1.0);
        assert_eq!(chrome.color, Vec3::ONE);
        assert!(chrome.maps.environment.is_none());
    }
}
