use std::collections::HashMap;

use glam::Mat4;

use crate::engine::graphics::{RenderAssets, Renderable};
use crate::engine::scene::{NodeKey, Scene};

/// Per-node instance payload (becomes GPU instance-buffer data).
#[derive(Debug, Clone, Copy)]
pub struct Instance {
    pub node: NodeKey,
    pub model: Mat4,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub instances: usize,
    pub batches: usize,
    /// Visible mesh nodes whose mesh or material was already disposed.
    pub skipped: usize,
}

/// Renderer-friendly draw list, organized for instanced draws.
/// Groups instances by `Renderable` (mesh + material).
#[derive(Debug, Default)]
pub struct VisualWorld {
    groups: HashMap<Renderable, Vec<Instance>>,
}

impl VisualWorld {
    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn groups(&self) -> &HashMap<Renderable, Vec<Instance>> {
        &self.groups
    }

    pub fn instance_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    #[cfg(test)]
    pub fn contains_node(&self, node: NodeKey) -> bool {
        self.groups
            .values()
            .any(|list| list.iter().any(|i| i.node == node))
    }

    pub fn push(&mut self, renderable: Renderable, instance: Instance) {
        self.groups.entry(renderable).or_default().push(instance);
    }

    /// Rebuild the draw list from the scene: every effectively visible mesh node whose
    /// resources are still alive.
    pub fn rebuild(&mut self, scene: &Scene, assets: &RenderAssets) -> DrawStats {
        self.clear();
        let mut skipped = 0;

        for key in scene.traverse_all() {
            let Some(renderable) = scene.get(key).and_then(|n| n.renderable()) else {
                continue;
            };
            if !scene.is_effectively_visible(key) {
                continue;
            }

            let (Some(_mesh), Some(material)) = (
                assets.mesh(renderable.mesh),
                assets.material(renderable.material),
            ) else {
                skipped += 1;
                continue;
            };

            let Some(model) = scene.world_matrix(key) else {
                continue;
            };

            self.push(
                renderable,
                Instance {
                    node: key,
                    model,
                    opacity: material.opacity,
                },
            );
        }

        DrawStats {
            instances: self.instance_count(),
            batches: self.groups.len(),
            skipped,
        }
    }
}
