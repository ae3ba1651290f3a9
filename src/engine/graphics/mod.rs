pub mod material;
pub mod mesh;
pub mod primitives;
pub mod render_assets;
pub mod renderer;
pub mod visual_world;

pub use material::{EnvironmentMap, Material, MaterialMaps, hex_color};
pub use mesh::{CpuMesh, MeshFactory};
pub use primitives::{MaterialHandle, MeshHandle, Renderable, TextureHandle};
pub use render_assets::{RenderAssets, TextureData};
pub use renderer::{DrawListRenderer, SceneRenderer};
pub use visual_world::{DrawStats, VisualWorld};
