use glam::Vec3;

use crate::engine::assets::{AssetLoader, TextureSlots};
use crate::engine::camera::PerspectiveCamera;
use crate::engine::config::PlacementSettings;
use crate::engine::demos::{Demo, add_light, white};
use crate::engine::graphics::{EnvironmentMap, RenderAssets, SceneRenderer, hex_color};
use crate::engine::placement::PlacementController;
use crate::engine::scene::Light;
use crate::engine::xr::XrFrame;
use crate::engine::{EngineResult, FrameClock, Universe};

/// Tap-to-place: a reticle tracks surfaces, a select drops a chrome model onto it.
pub struct PlacementDemo {
    universe: Universe,
    environment: TextureSlots,
    controller: PlacementController,
}

impl PlacementDemo {
    pub fn new(settings: &PlacementSettings, loader: Box<dyn AssetLoader>) -> Self {
        let camera = PerspectiveCamera::new(70.0, 4.0 / 3.0, 0.01, 20.0);
        let mut universe = Universe::new(camera);

        add_light(
            &mut universe,
            "hemisphere_light",
            Light::Hemisphere {
                sky: white(),
                ground: hex_color(0xbbbbff),
                intensity: 1.2,
            },
            Vec3::new(0.5, 1.0, 0.25),
        );
        add_light(
            &mut universe,
            "directional_light",
            Light::Directional {
                color: white(),
                intensity: 2.5,
            },
            Vec3::new(5.0, 10.0, 7.0),
        );
        add_light(
            &mut universe,
            "ambient_light",
            Light::Ambient {
                color: white(),
                intensity: 1.5,
            },
            Vec3::ZERO,
        );

        let mut environment = TextureSlots::new();
        universe.scene.environment = Some(request_environment(
            &mut environment,
            &mut universe.assets,
            loader.as_ref(),
            settings,
        ));

        let controller =
            PlacementController::new(&mut universe, loader, settings.controller_config());

        Self {
            universe,
            environment,
            controller,
        }
    }
}

/// Cube map faces are joined onto the base URL and exposed to the scene straight away;
/// the pixels arrive later behind the same handles.
fn request_environment(
    slots: &mut TextureSlots,
    assets: &mut RenderAssets,
    loader: &dyn AssetLoader,
    settings: &PlacementSettings,
) -> EnvironmentMap {
    let faces = settings.environment_faces.each_ref().map(|face| {
        let url = format!("{}{}", settings.environment_base_url, face);
        slots.request(assets, loader, &url)
    });
    EnvironmentMap { faces }
}

impl Demo for PlacementDemo {
    fn name(&self) -> &'static str {
        "placement"
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
        frame: Option<&mut dyn XrFrame>,
        renderer: &mut dyn SceneRenderer,
    ) -> EngineResult<()> {
        self.environment.flush_pending(&mut self.universe.assets);
        self.controller.dispatch_events(&mut self.universe);
        self.controller.on_frame(frame, &mut self.universe, renderer)
    }

    fn select(&mut self) {
        let outcome = self.controller.on_select(&mut self.universe);
        log::debug!("select: {outcome:?}");
    }

    fn placement(&self) -> Option<&PlacementController> {
        Some(&self.controller)
    }
}
