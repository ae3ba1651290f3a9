use glam::{Mat4, Vec3};

use crate::engine::EngineResult;
use crate::engine::camera::PerspectiveCamera;
use crate::engine::graphics::visual_world::Instance;
use crate::engine::graphics::{DrawStats, RenderAssets, VisualWorld};
use crate::engine::scene::Scene;

/// Seam between the demos and whatever actually rasterizes.
pub trait SceneRenderer {
    fn render(
        &mut self,
        scene: &Scene,
        assets: &RenderAssets,
        camera: &PerspectiveCamera,
    ) -> EngineResult<()>;
}

/// Front half of a renderer: turns the scene into an instanced draw list plus the camera
/// matrices a GPU backend would upload.
///
/// Logs the draw summary only when it changes, so a steady scene stays quiet.
#[derive(Debug, Default)]
pub struct DrawListRenderer {
    visuals: VisualWorld,
    view_proj: Mat4,
    frames_rendered: u64,
    last_stats: Option<DrawStats>,
}

impl DrawListRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized device coordinates of an instance's origin, depth in `[0, 1]`.
    pub fn ndc(&self, instance: &Instance) -> Vec3 {
        self.view_proj.project_point3(instance.model.w_axis.truncate())
    }

    #[cfg(test)]
    pub fn visuals(&self) -> &VisualWorld {
        &self.visuals
    }

    #[cfg(test)]
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    #[cfg(test)]
    pub fn last_stats(&self) -> DrawStats {
        self.last_stats.unwrap_or_default()
    }
}

impl SceneRenderer for DrawListRenderer {
    fn render(
        &mut self,
        scene: &Scene,
        assets: &RenderAssets,
        camera: &PerspectiveCamera,
    ) -> EngineResult<()> {
        let stats = self.visuals.rebuild(scene, assets);
        self.view_proj = camera.projection() * camera.view();
        self.frames_rendered += 1;

        if self.last_stats != Some(stats) {
            log::debug!(
                "draw list: {} instances in {} batches (frame {})",
                stats.instances,
                stats.batches,
                self.frames_rendered
            );
            if stats.skipped > 0 {
                log::warn!(
                    "draw list: skipped {} mesh nodes with released resources",
                    stats.skipped
                );
            }
            self.last_stats = Some(stats);
        }
        if log::log_enabled!(log::Level::Trace) {
            for (renderable, instances) in self.visuals.groups() {
                for instance in instances {
                    log::trace!(
                        "{renderable:?}: node {:?} at ndc {} (opacity {})",
                        instance.node,
                        self.ndc(instance),
                        instance.opacity
                    );
                }
            }
        }
        log::trace!("frame {} rendered", self.frames_rendered);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::{Material, MeshFactory, Renderable};
    use crate::engine::scene::Node;

    #[test]
    fn draw_list_skips_hidden_and_released_nodes() {
        let mut scene = Scene::new();
        let mut assets = RenderAssets::new();
        let camera = PerspectiveCamera::default();

        let mesh = assets.add_mesh(MeshFactory::circle(0.3, 16));
        let material = assets.add_material(Material::standard("disc"));
        let renderable = Renderable::new(mesh, material);

        let shown = scene.add(Node::mesh("shown", renderable));
        let group = scene.add(Node::group("hidden group").hidden());
        let hidden = scene.add_child(group, Node::mesh("hidden", renderable)).unwrap();

        let released_mesh = assets.add_mesh(MeshFactory::circle(0.3, 16));
        let released = scene.add(Node::mesh("released", Renderable::new(released_mesh, material)));
        assets.dispose_mesh(released_mesh);

        let mut renderer = DrawListRenderer::new();
        renderer.render(&scene, &assets, &camera).unwrap();

        let visuals = renderer.visuals();
        assert!(visuals.contains_node(shown));
        assert!(!visuals.contains_node(hidden));
        assert!(!visuals.contains_node(released));
        assert_eq!(
            renderer.last_stats(),
            DrawStats {
                instances: 1,
                batches: 1,
                skipped: 1
            }
        );
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn instance_ahead_of_camera_lands_inside_clip_space() {
        let mut scene = Scene::new();
        let mut assets = RenderAssets::new();
        let mut camera = PerspectiveCamera::default();
        camera.transform.translation = Vec3::new(0.0, 1.0, 0.0);
        camera.look_at(Vec3::new(0.0, 1.0, -1.0));

        let renderable = Renderable::new(
            assets.add_mesh(MeshFactory::circle(0.3, 16)),
            assets.add_material(Material::basic("dot")),
        );
        let ahead = scene.add(Node::mesh("ahead", renderable).with_translation(Vec3::new(0.0, 1.0, -5.0)));
        let left = scene.add(Node::mesh("left", renderable).with_translation(Vec3::new(-1.0, 1.0, -5.0)));

        let mut renderer = DrawListRenderer::new();
        renderer.render(&scene, &assets, &camera).unwrap();

        let instances = &renderer.visuals().groups()[&renderable];
        let ndc_of = |key| {
            let instance = instances.iter().find(|i| i.node == key).unwrap();
            renderer.ndc(instance)
        };

        let centre = ndc_of(ahead);
        assert!(centre.x.abs() < 1e-4 && centre.y.abs() < 1e-4);
        assert!(centre.z > 0.0 && centre.z < 1.0);

        let side = ndc_of(left);
        assert!(side.x < 0.0 && side.x > -1.0);
    }
}
