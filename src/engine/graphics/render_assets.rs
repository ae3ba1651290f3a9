use slotmap::SlotMap;

use crate::engine::graphics::mesh::CpuMesh;
use crate::engine::graphics::{Material, MaterialHandle, MeshHandle, TextureHandle};

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    /// 1×1 texture of a single color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }
}

/// Registry of everything a draw can reference.
///
/// Design:
/// - Scene nodes refer to geometry, materials and textures by handle.
/// - `dispose_*` releases the resource; the handle then never resolves again, so a
///   stale node is detectable instead of silently drawing freed data.
/// - Disposing a material does not touch the textures it samples.
#[derive(Debug, Default)]
pub struct RenderAssets {
    meshes: SlotMap<MeshHandle, CpuMesh>,
    materials: SlotMap<MaterialHandle, Material>,
    textures: SlotMap<TextureHandle, TextureData>,
}

impl RenderAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: CpuMesh) -> MeshHandle {
        self.meshes.insert(mesh)
    }

    pub fn mesh(&self, h: MeshHandle) -> Option<&CpuMesh> {
        self.meshes.get(h)
    }

    /// Returns `false` if the mesh was already released.
    pub fn dispose_mesh(&mut self, h: MeshHandle) -> bool {
        self.meshes.remove(h).is_some()
    }

    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        self.materials.insert(material)
    }

    pub fn material(&self, h: MaterialHandle) -> Option<&Material> {
        self.materials.get(h)
    }

    pub fn material_mut(&mut self, h: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(h)
    }

    #[cfg(test)]
    pub fn materials(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> {
        self.materials.iter()
    }

    /// Returns `false` if the material was already released.
    pub fn dispose_material(&mut self, h: MaterialHandle) -> bool {
        self.materials.remove(h).is_some()
    }

    pub fn add_texture(&mut self, texture: TextureData) -> TextureHandle {
        self.textures.insert(texture)
    }

    #[cfg(test)]
    pub fn texture(&self, h: TextureHandle) -> Option<&TextureData> {
        self.textures.get(h)
    }

    /// Swap in new pixels behind an existing handle (placeholder → decoded image).
    pub fn replace_texture(&mut self, h: TextureHandle, texture: TextureData) -> bool {
        match self.textures.get_mut(h) {
            Some(slot) => {
                *slot = texture;
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    #[cfg(test)]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    #[cfg(test)]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::MeshFactory;

    #[test]
    fn disposed_handles_never_resolve_again() {
        let mut assets = RenderAssets::new();

        let mesh = assets.add_mesh(MeshFactory::circle(1.0, 8));
        let material = assets.add_material(Material::reticle());

        assert!(assets.dispose_mesh(mesh));
        assert!(assets.dispose_material(material));
        assert!(assets.mesh(mesh).is_none());
        assert!(assets.material(material).is_none());
        assert!(!assets.dispose_mesh(mesh));

        // A new allocation in the same slot gets a fresh version.
        let again = assets.add_mesh(MeshFactory::circle(1.0, 8));
        assert_ne!(again, mesh);
        assert!(assets.mesh(mesh).is_none());
    }

    #[test]
    fn disposing_a_material_keeps_its_textures() {
        let mut assets = RenderAssets::new();

        let tex = assets.add_texture(TextureData {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        });
        let mut maps = crate::engine::graphics::MaterialMaps::default();
        maps.base_color = Some(tex);
        let material = assets.add_material(Material::textured(maps));

        assets.dispose_material(material);

        assert_eq!(assets.texture_count(), 1);
        assert!(assets.texture(tex).is_some());
    }
}
