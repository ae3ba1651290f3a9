//! Scene graph.
//!
//! Nodes live in a single slotmap; each node carries its own parent/children links, so a
//! `NodeKey` stays valid until that node (or an ancestor) is removed. A removed key never
//! resolves again.

pub mod light;
pub mod snapshot;
pub mod transform;


use glam::Mat4;
use slotmap::SlotMap;
use uuid::Uuid;

use crate::engine::graphics::{EnvironmentMap, Renderable};

pub use light::Light;
pub use snapshot::SceneSnapshot;
pub use transform::Transform;

slotmap::new_key_type! {
    pub struct NodeKey;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(Renderable),
    Light(Light),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Mesh(_) => "mesh",
            NodeKind::Light(light) => light.kind_name(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub guid: Uuid,
    pub transform: Transform,

    /// When set, used verbatim as the local matrix instead of `transform`.
    /// Poses coming straight from the session are written here.
    pub matrix_override: Option<Mat4>,

    pub visible: bool,
    pub kind: NodeKind,

    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            guid: Uuid::new_v4(),
            transform: Transform::default(),
            matrix_override: None,
            visible: true,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, renderable: Renderable) -> Self {
        Self::new(name, NodeKind::Mesh(renderable))
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_translation(mut self, translation: glam::Vec3) -> Self {
        self.transform.translation = translation;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.matrix_override
            .unwrap_or_else(|| self.transform.matrix())
    }

    pub fn renderable(&self) -> Option<Renderable> {
        match self.kind {
            NodeKind::Mesh(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeKey, Node>,
    roots: Vec<NodeKey>,

    /// Reflection cube map shared by reflective materials.
    pub environment: Option<EnvironmentMap>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node at the top level.
    pub fn add(&mut self, mut node: Node) -> NodeKey {
        node.parent = None;
        node.children.clear();
        let key = self.nodes.insert(node);
        self.roots.push(key);
        key
    }

    /// Add a node under `parent`. Returns `None` if `parent` is not in the scene.
    pub fn add_child(&mut self, parent: NodeKey, mut node: Node) -> Option<NodeKey> {
        if !self.nodes.contains_key(parent) {
            return None;
        }

        node.parent = Some(parent);
        node.children.clear();
        let key = self.nodes.insert(node);
        self.nodes[parent].children.push(key);
        Some(key)
    }

    /// Detach `key` from its parent and remove it with all descendants.
    ///
    /// Returns the removed nodes, parent before children. Empty if `key` was not present.
    pub fn remove_subtree(&mut self, key: NodeKey) -> Vec<Node> {
        if !self.nodes.contains_key(key) {
            return Vec::new();
        }

        match self.nodes[key].parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(parent) {
                    p.children.retain(|&c| c != key);
                }
            }
            None => self.roots.retain(|&r| r != key),
        }

        self.traverse(key)
            .into_iter()
            .filter_map(|k| self.nodes.remove(k))
            .collect()
    }

    #[cfg(test)]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    pub fn parent_of(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|n| n.parent)
    }

    pub fn children_of(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(key)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[cfg(test)]
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name == name)
            .map(|(k, _)| k)
    }

    /// Depth-first walk of the subtree rooted at `key`, parents before children.
    pub fn traverse(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut order = Vec::new();
        let mut stack = vec![key];

        while let Some(k) = stack.pop() {
            let Some(node) = self.nodes.get(k) else {
                continue;
            };
            order.push(k);
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }

        order
    }

    /// Every node, roots first, each subtree in `traverse` order.
    pub fn traverse_all(&self) -> Vec<NodeKey> {
        self.roots
            .iter()
            .flat_map(|&r| self.traverse(r))
            .collect()
    }

    pub fn world_matrix(&self, key: NodeKey) -> Option<Mat4> {
        let node = self.nodes.get(key)?;
        let mut m = node.local_matrix();
        let mut cur = node.parent;
        while let Some(p) = cur {
            let parent = self.nodes.get(p)?;
            m = parent.local_matrix() * m;
            cur = parent.parent;
        }
        Some(m)
    }

    /// A node is drawn only if it and all of its ancestors are visible.
    pub fn is_effectively_visible(&self, key: NodeKey) -> bool {
        let mut cur = Some(key);
        while let Some(k) = cur {
            if !self.nodes.get(k).is_some_and(|n| n.visible) {
                return false;
            }
            cur = self.parent_of(k);
        }
        true
    }
}
