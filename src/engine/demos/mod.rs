//! The three demos and the trait the hosts drive them through.

pub mod orbit;
pub mod placement;
pub mod primitives;
pub mod showcase;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::engine::assets::AssetLoader;
use crate::engine::config::AppConfig;
use crate::engine::graphics::{SceneRenderer, hex_color};
use crate::engine::placement::PlacementController;
use crate::engine::scene::{Light, Node, NodeKey};
use crate::engine::user_input::InputState;
use crate::engine::xr::XrFrame;
use crate::engine::{EngineResult, FrameClock, Universe};

pub use orbit::OrbitControls;
pub use placement::PlacementDemo;
pub use primitives::PrimitivesDemo;
pub use showcase::ShowcaseDemo;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DemoKind {
    /// Three animated procedural shapes with orbit controls.
    Primitives,
    /// A textured, slowly turning glTF model.
    Showcase,
    /// Tap-to-place on detected surfaces.
    #[default]
    Placement,
}

impl DemoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoKind::Primitives => "primitives",
            DemoKind::Showcase => "showcase",
            DemoKind::Placement => "placement",
        }
    }
}

/// A scene plus its per-frame behavior.
pub trait Demo {
    fn name(&self) -> &'static str;

    fn universe(&self) -> &Universe;

    fn universe_mut(&mut self) -> &mut Universe;

    /// Per-frame callback. `frame` is present only while an immersive session runs.
    fn update(
        &mut self,
        clock: &FrameClock,
        frame: Option<&mut dyn XrFrame>,
        renderer: &mut dyn SceneRenderer,
    ) -> EngineResult<()>;

    /// The "select" gesture (tap / click).
    fn select(&mut self) {}

    fn handle_input(&mut self, _input: &InputState) {}

    fn resize(&mut self, width: u32, height: u32) {
        self.universe_mut().camera.set_viewport_size(width, height);
    }

    fn placement(&self) -> Option<&PlacementController> {
        None
    }
}

pub fn build(kind: DemoKind, config: &AppConfig, loader: Box<dyn AssetLoader>) -> Box<dyn Demo> {
    log::info!("building demo '{}'", kind.as_str());
    match kind {
        DemoKind::Primitives => Box::new(PrimitivesDemo::new()),
        DemoKind::Showcase => Box::new(ShowcaseDemo::new(&config.showcase, loader)),
        DemoKind::Placement => Box::new(PlacementDemo::new(&config.placement, loader)),
    }
}

pub(crate) fn add_light(universe: &mut Universe, name: &str, light: Light, position: Vec3) -> NodeKey {
    universe
        .scene
        .add(Node::light(name, light).with_translation(position))
}

/// White light helpers; every demo lights its scene with white.
pub(crate) fn white() -> Vec3 {
    hex_color(0xffffff)
}
