//! JSON dump of a scene's node tree, for inspecting what a run left behind.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::EngineResult;
use crate::engine::scene::{NodeKey, Scene, Transform};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub guid: Uuid,

    /// Node kind name (e.g. "group", "mesh", "point_light").
    pub kind: String,

    pub transform: Transform,

    /// Column-major matrix override, if the node has one.
    pub matrix_override: Option<[f32; 16]>,

    pub visible: bool,
    pub children: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub has_environment: bool,
    pub roots: Vec<NodeSnapshot>,
}

impl SceneSnapshot {
    pub fn capture(scene: &Scene) -> Self {
        Self {
            has_environment: scene.environment.is_some(),
            roots: scene
                .roots()
                .iter()
                .filter_map(|&r| Self::capture_node(scene, r))
                .collect(),
        }
    }

    fn capture_node(scene: &Scene, key: NodeKey) -> Option<NodeSnapshot> {
        let node = scene.get(key)?;
        Some(NodeSnapshot {
            name: node.name.clone(),
            guid: node.guid,
            kind: node.kind.name().to_string(),
            transform: node.transform,
            matrix_override: node.matrix_override.map(|m| m.to_cols_array()),
            visible: node.visible,
            children: scene
                .children_of(key)
                .iter()
                .filter_map(|&c| Self::capture_node(scene, c))
                .collect(),
        })
    }

    pub fn node_count(&self) -> usize {
        fn count(n: &NodeSnapshot) -> usize {
            1 + n.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> EngineResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
