use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

use crate::engine::Universe;
use crate::engine::graphics::{Material, MeshFactory, Renderable};
use crate::engine::scene::{Node, NodeKey, Transform};
use crate::engine::xr::Pose;

pub const RETICLE_INNER_RADIUS: f32 = 0.15;
pub const RETICLE_OUTER_RADIUS: f32 = 0.2;
pub const RETICLE_SEGMENTS: u32 = 32;

/// Add the placement marker: a flat white ring lying in the XZ plane, hidden until the
/// first hit. Its world matrix comes from the hit pose, not from its TRS.
pub fn spawn_reticle(universe: &mut Universe) -> NodeKey {
    let mut ring = MeshFactory::ring(
        RETICLE_INNER_RADIUS,
        RETICLE_OUTER_RADIUS,
        RETICLE_SEGMENTS,
    );
    ring.apply_matrix(Mat4::from_rotation_x(-FRAC_PI_2));

    let renderable = Renderable::new(
        universe.assets.add_mesh(ring),
        universe.assets.add_material(Material::reticle()),
    );
    let mut node = Node::mesh("reticle", renderable).hidden();
    node.matrix_override = Some(Mat4::IDENTITY);

    universe.scene.add(node)
}

/// Mirror the controller's reticle state onto its scene node.
pub fn sync_reticle(universe: &mut Universe, key: NodeKey, visible: bool, pose: Option<Pose>) {
    let Some(node) = universe.scene.get_mut(key) else {
        return;
    };

    node.visible = visible;
    if let Some(pose) = pose {
        node.matrix_override = Some(pose.matrix());
        // Keep the TRS readable too (snapshots, placement).
        node.transform = Transform {
            translation: pose.position,
            rotation: pose.orientation,
            scale: Vec3::ONE,
        };
    }
}
