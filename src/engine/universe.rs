use std::collections::HashSet;

use crate::engine::EngineResult;
use crate::engine::camera::PerspectiveCamera;
use crate::engine::graphics::{RenderAssets, SceneRenderer};
use crate::engine::scene::{NodeKey, Scene};

/// Everything one demo renders: scene graph, the resources it references, and the camera.
#[derive(Debug, Default)]
pub struct Universe {
    pub scene: Scene,
    pub assets: RenderAssets,
    pub camera: PerspectiveCamera,
}

/// What `Universe::dispose_subtree` released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Released {
    pub nodes: usize,
    pub meshes: usize,
    pub materials: usize,
}

impl Universe {
    pub fn new(camera: PerspectiveCamera) -> Self {
        Self {
            scene: Scene::new(),
            assets: RenderAssets::new(),
            camera,
        }
    }

    /// Remove a subtree from the scene and release the meshes and materials its nodes
    /// reference. A material shared by several meshes is released once.
    pub fn dispose_subtree(&mut self, key: NodeKey) -> Released {
        let removed = self.scene.remove_subtree(key);

        let mut meshes = HashSet::new();
        let mut materials = HashSet::new();
        for node in &removed {
            if let Some(r) = node.renderable() {
                meshes.insert(r.mesh);
                materials.insert(r.material);
            }
        }

        Released {
            nodes: removed.len(),
            meshes: meshes
                .into_iter()
                .filter(|&m| self.assets.dispose_mesh(m))
                .count(),
            materials: materials
                .into_iter()
                .filter(|&m| self.assets.dispose_material(m))
                .count(),
        }
    }

    pub fn render(&self, renderer: &mut dyn SceneRenderer) -> EngineResult<()> {
        renderer.render(&self.scene, &self.assets, &self.camera)
    }
}
