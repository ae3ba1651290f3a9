use glam::Vec3;

use crate::engine::assets::{AssetLoader, LoadEvent, LoadHandle, ModelAsset, TextureSlots};
use crate::engine::camera::PerspectiveCamera;
use crate::engine::config::ShowcaseSettings;
use crate::engine::demos::{Demo, add_light, white};
use crate::engine::graphics::{Material, MaterialHandle, MaterialMaps, SceneRenderer};
use crate::engine::scene::{Light, NodeKey};
use crate::engine::xr::XrFrame;
use crate::engine::{EngineResult, FrameClock, Universe};

const MODEL_DISTANCE: f32 = 10.0;
const MODEL_SCALE: f32 = 1.0 / 6.0;
const TILT_DEGREES: f32 = -20.0;
const TURN_DEGREES_PER_FRAME: f32 = 0.2;

/// A single textured glTF model turning in front of the camera.
pub struct ShowcaseDemo {
    universe: Universe,
    textures: TextureSlots,
    material: MaterialHandle,

    model_load: Option<LoadHandle<ModelAsset>>,
    model: Option<NodeKey>,
    /// Accumulated yaw; only advances once the model is in the scene.
    degrees: f32,
}

impl ShowcaseDemo {
    pub fn new(settings: &ShowcaseSettings, loader: Box<dyn AssetLoader>) -> Self {
        let camera = PerspectiveCamera::new(70.0, 4.0 / 3.0, 0.01, 40.0);
        let mut universe = Universe::new(camera);

        add_light(
            &mut universe,
            "directional_light",
            Light::Directional {
                color: white(),
                intensity: 2.0,
            },
            Vec3::new(5.0, 5.0, 5.0),
        );
        add_light(
            &mut universe,
            "ambient_light",
            Light::Ambient {
                color: white(),
                intensity: 2.0,
            },
            Vec3::ZERO,
        );

        let mut textures = TextureSlots::new();
        let assets = &mut universe.assets;
        let maps = MaterialMaps {
            base_color: Some(textures.request(assets, loader.as_ref(), &settings.base_color_url)),
            normal: Some(textures.request(assets, loader.as_ref(), &settings.normal_url)),
            roughness: Some(textures.request(assets, loader.as_ref(), &settings.roughness_url)),
            emissive: Some(textures.request(assets, loader.as_ref(), &settings.emissive_url)),
            environment: None,
        };
        let material = universe.assets.add_material(Material::textured(maps));

        log::info!("loading showcase model from {}", settings.model_url);
        let model_load = Some(loader.load_model(&settings.model_url));

        Self {
            universe,
            textures,
            material,
            model_load,
            model: None,
            degrees: 0.0,
        }
    }

    #[cfg(test)]
    pub fn model(&self) -> Option<NodeKey> {
        self.model
    }

    fn poll_model(&mut self) {
        let Some(load) = self.model_load.as_mut() else {
            return;
        };

        for event in load.poll() {
            match event {
                LoadEvent::Progress { .. } => {
                    if let Some(percent) = event.percent() {
                        log::debug!("{}: {percent:.0}% loaded", load.url());
                    }
                }
                LoadEvent::Loaded(asset) => {
                    let root = asset.instantiate(&mut self.universe, self.material);
                    if let Some(node) = self.universe.scene.get_mut(root) {
                        node.transform.translation = Vec3::new(0.0, 0.0, -MODEL_DISTANCE);
                        node.transform.set_uniform_scale(MODEL_SCALE);
                    }
                    log::info!("showcase model '{}' added ({} meshes)", asset.name, asset.mesh_count());
                    self.model = Some(root);
                }
                LoadEvent::Failed(e) => log::error!("failed to load {}: {e}", load.url()),
            }
        }

        if load.is_finished() {
            self.model_load = None;
        }
    }

    fn turn(&mut self) {
        let Some(node) = self.model.and_then(|key| self.universe.scene.get_mut(key)) else {
            return;
        };
        self.degrees += TURN_DEGREES_PER_FRAME;
        node.transform
            .set_euler_xyz(TILT_DEGREES.to_radians(), self.degrees.to_radians(), 0.0);
    }
}

impl Demo for ShowcaseDemo {
    fn name(&self) -> &'static str {
        "showcase"
    }

    fn universe(&self) -> &Universe {
        &self.universe
    }

    fn universe_mut(&mut self) -> &mut Universe {
        &mut self.universe
    }

    fn update(
        &mut self,
        _clock: &FrameClock,
        _frame: Option<&mut dyn XrFrame>,
        renderer: &mut dyn SceneRenderer,
    ) -> EngineResult<()> {
        self.textures.flush_pending(&mut self.universe.assets);
        self.poll_model();
        self.turn();
        self.universe.render(renderer)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::engine::assets::test_loader::ManualLoader;
    use crate::engine::assets::AssetError;
    use crate::engine::assets::gltf_import::ModelNode;
    use crate::engine::graphics::{DrawListRenderer, MeshFactory, TextureData};
    use crate::engine::scene::Transform;

    fn dog() -> ModelAsset {
        ModelAsset {
            name: "dog".into(),
            roots: vec![ModelNode {
                name: "body".into(),
                transform: Transform::default(),
                meshes: vec![MeshFactory::circle(0.5, 12)],
                children: Vec::new(),
            }],
        }
    }

    fn demo() -> (ShowcaseDemo, ManualLoader) {
        let loader = ManualLoader::default();
        let demo = ShowcaseDemo::new(&ShowcaseSettings::default(), Box::new(loader.clone()));
        (demo, loader)
    }

    #[test]
    fn requests_the_four_maps_and_the_model() {
        let (demo, loader) = demo();
        let settings = ShowcaseSettings::default();

        assert_eq!(
            loader.texture_urls(),
            [
                settings.base_color_url.as_str(),
                settings.normal_url.as_str(),
                settings.roughness_url.as_str(),
                settings.emissive_url.as_str(),
            ]
        );
        assert_eq!(loader.model_requests(), 1);
        assert_eq!(loader.model_url(0), settings.model_url);

        let material = demo.universe.assets.material(demo.material).unwrap();
        assert_eq!(material.metalness, 1.0);
        assert_eq!(material.emissive, Vec3::ONE);
        assert!(material.maps.emissive.is_some());
    }

    #[test]
    fn model_turns_once_loaded() {
        let (mut demo, loader) = demo();
        let mut renderer = DrawListRenderer::new();
        let clock = FrameClock::new();

        demo.update(&clock, None, &mut renderer).unwrap();
        assert!(demo.model().is_none());
        assert_eq!(demo.degrees, 0.0);

        loader.complete_model(0, Ok(dog()));
        for _ in 0..5 {
            demo.update(&clock, None, &mut renderer).unwrap();
        }

        let root = demo.model().unwrap();
        let node = demo.universe.scene.get(root).unwrap();
        assert_eq!(node.transform.translation, Vec3::new(0.0, 0.0, -10.0));
        assert_relative_eq!(node.transform.scale.x, 1.0 / 6.0);
        assert_relative_eq!(demo.degrees, 1.0, epsilon = 1e-5);
        assert_eq!(renderer.visuals().instance_count(), 1);
        assert!(demo.model_load.is_none());
    }

    #[test]
    fn decoded_map_replaces_placeholder() {
        let (mut demo, loader) = demo();
        let mut renderer = DrawListRenderer::new();
        let normal = demo
            .universe
            .assets
            .material(demo.material)
            .unwrap()
            .maps
            .normal
            .unwrap();

        let pixels = TextureData::solid([0, 0, 255, 255]);
        loader.complete_texture(1, Ok(pixels.clone()));
        demo.update(&FrameClock::new(), None, &mut renderer).unwrap();

        assert_eq!(demo.universe.assets.texture(normal), Some(&pixels));
        assert_eq!(demo.textures.pending_count(), 3);
    }

    #[test]
    fn failed_model_leaves_an_empty_stage() {
        let (mut demo, loader) = demo();
        let mut renderer = DrawListRenderer::new();

        loader.complete_model(0, Err(AssetError::Unsupported("draco".into())));
        demo.update(&FrameClock::new(), None, &mut renderer).unwrap();

        assert!(demo.model().is_none());
        assert!(demo.model_load.is_none());
        assert_eq!(renderer.visuals().instance_count(), 0);
    }
}
