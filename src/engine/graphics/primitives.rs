//! Renderer-owned resource handles.

slotmap::new_key_type! {
    pub struct MeshHandle;
    pub struct MaterialHandle;
    pub struct TextureHandle;
}

/// What a mesh node draws: geometry plus the material it is shaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Renderable {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
}

impl Renderable {
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self { mesh, material }
    }
}
