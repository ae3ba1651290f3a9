use std::f32::consts::FRAC_PI_2;

use glam::Vec3;

use crate::engine::camera::PerspectiveCamera;
use crate::engine::demos::{Demo, OrbitControls, add_light, white};
use crate::engine::graphics::{
    Material, MaterialHandle, MeshFactory, Renderable, SceneRenderer, hex_color,
};
use crate::engine::scene::{Light, Node, NodeKey};
use crate::engine::user_input::InputState;
use crate::engine::xr::XrFrame;
use crate::engine::{EngineResult, FrameClock, Universe};

/// Per-frame rotation increments (radians) and oscillation rates (per millisecond).
const ICOSAHEDRON_SPIN_Y: f32 = 0.02;
const TORUS_SPIN_X: f32 = 0.025;
const TORUS_SPIN_Z: f32 = 0.015;
const DISC_SPIN_Z: f32 = 0.018;

/// Pose and opacity of the three shapes at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeFrame {
    pub icosahedron_y: f32,
    pub torus_scale: f32,
    pub disc_opacity: f32,
    pub disc_y: f32,
    pub disc_scale: f32,
}

impl ShapeFrame {
    /// Time-driven part of the animation, `t` in milliseconds.
    pub fn at(t: f64) -> Self {
        let wave = |rate: f64| (t * rate).sin() as f32;
        Self {
            icosahedron_y: wave(0.002) * 0.15,
            torus_scale: 1.0 + 0.2 * wave(0.003),
            disc_opacity: 0.7 + 0.3 * wave(0.0015).abs(),
            disc_y: 0.15 * wave(0.0025),
            disc_scale: 1.0 + 0.15 * wave(0.004),
        }
    }
}

/// Icosahedron, torus and disc, each with its own motion.
pub struct PrimitivesDemo {
    universe: Universe,
    controls: OrbitControls,

    icosahedron: NodeKey,
    torus: NodeKey,
    disc: NodeKey,
    disc_material: MaterialHandle,

    /// Accumulated Euler angles (XYZ), advanced by a fixed step every frame.
    icosahedron_rotation: Vec3,
    torus_rotation: Vec3,
    disc_rotation: Vec3,
}

impl PrimitivesDemo {
    pub fn new() -> Self {
        let mut camera = PerspectiveCamera::new(70.0, 4.0 / 3.0, 0.01, 40.0);
        camera.transform.translation = Vec3::new(0.0, 0.0, 3.0);
        let mut universe = Universe::new(camera);

        add_light(
            &mut universe,
            "directional_light",
            Light::Directional {
                color: white(),
                intensity: 4.0,
            },
            Vec3::new(3.0, 3.0, 3.0),
        );
        add_light(
            &mut universe,
            "point_light",
            Light::Point {
                color: white(),
                intensity: 10.0,
                distance: 10.0,
            },
            Vec3::new(-2.0, 2.0, 2.0),
        );
        add_light(
            &mut universe,
            "ambient_light",
            Light::Ambient {
                color: white(),
                intensity: 1.2,
            },
            Vec3::ZERO,
        );

        let icosahedron_material = Material {
            color: hex_color(0x00bfff),
            metalness: 0.7,
            roughness: 0.2,
            flat_shading: true,
            emissive: hex_color(0x222244),
            emissive_intensity: 0.3,
            ..Material::standard("icosahedron")
        };
        let icosahedron = Renderable::new(
            universe.assets.add_mesh(MeshFactory::icosahedron(0.35, 0)),
            universe.assets.add_material(icosahedron_material),
        );
        let icosahedron = universe.scene.add(
            Node::mesh("icosahedron", icosahedron).with_translation(Vec3::new(-0.75, 0.0, 0.0)),
        );

        let torus_material = Material {
            color: hex_color(0xff69b4),
            metalness: 0.9,
            roughness: 0.1,
            clearcoat: 1.0,
            clearcoat_roughness: 0.05,
            reflectivity: 0.8,
            transmission: 0.5,
            transparent: true,
            opacity: 0.8,
            ..Material::physical("torus")
        };
        let torus = Renderable::new(
            universe.assets.add_mesh(MeshFactory::torus(0.25, 0.09, 16, 100)),
            universe.assets.add_material(torus_material),
        );
        let torus = universe.scene.add(Node::mesh("torus", torus));

        let disc_material = Material {
            color: hex_color(0x32cd32),
            double_sided: true,
            metalness: 0.3,
            roughness: 0.7,
            emissive: hex_color(0x003300),
            emissive_intensity: 0.5,
            ..Material::standard("disc")
        };
        let disc_material = universe.assets.add_material(disc_material);
        let disc = Renderable::new(
            universe.assets.add_mesh(MeshFactory::circle(0.3, 64)),
            disc_material,
        );
        let disc_rotation = Vec3::new(FRAC_PI_2, 0.0, 0.0);
        let mut disc = Node::mesh("disc", disc).with_translation(Vec3::new(0.75, 0.0, 0.0));
        disc.transform
            .set_euler_xyz(disc_rotation.x, disc_rotation.y, disc_rotation.z);
        let disc = universe.scene.add(disc);

        let controls = OrbitControls::new(&universe.camera, Vec3::ZERO).with_damping(true);

        Self {
            universe,
            controls,
            icosahedron,
            torus,
            disc,
            disc_material,
            icosahedron_rotation: Vec3::ZERO,
            torus_rotation: Vec3::ZERO,
            disc_rotation,
        }
    }

    fn animate(&mut self, t: f64) {
        let shape = ShapeFrame::at(t);

        self.icosahedron_rotation.y += ICOSAHEDRON_SPIN_Y;
        self.torus_rotation.x += TORUS_SPIN_X;
        self.torus_rotation.z += TORUS_SPIN_Z;
        self.disc_rotation.z += DISC_SPIN_Z;

        let scene = &mut self.universe.scene;
        if let Some(node) = scene.get_mut(self.icosahedron) {
            let r = self.icosahedron_rotation;
            node.transform.set_euler_xyz(r.x, r.y, r.z);
            node.transform.translation.y = shape.icosahedron_y;
        }
        if let Some(node) = scene.get_mut(self.torus) {
            let r = self.torus_rotation;
            node.transform.set_euler_xyz(r.x, r.y, r.z);
            node.transform.set_uniform_scale(shape.torus_scale);
        }
        if let Some(node) = scene.get_mut(self.disc) {
            let r = self.disc_rotation;
            node.transform.set_euler_xyz(r.x, r.y, r.z);
            node.transform.translation.y = shape.disc_y;
            node.transform.set_uniform_scale(shape.disc_scale);
        }
        if let Some(material) = self.universe.assets.material_mut(self.disc_material) {
            material.opacity = shape.disc_opacity;
        }
    }
}

impl Default for PrimitivesDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl Demo for PrimitivesDemo {
    fn name(&self) -> &'static str {
        "primitives"
    }

    fn universe(&self) -> &Universe {
        &self.universe
    }

    fn universe_mut(&mut self) -> &mut Universe {
        &mut self.universe
    }

    fn update(
        &mut self,
        clock: &FrameClock,
        _frame: Option<&mut dyn XrFrame>,
        renderer: &mut dyn SceneRenderer,
    ) -> EngineResult<()> {
        self.animate(clock.elapsed_ms);
        self.controls.update(&mut self.universe.camera);
        self.universe.render(renderer)
    }

    fn handle_input(&mut self, input: &InputState) {
        self.controls.handle_input(input);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::engine::graphics::DrawListRenderer;

    #[test]
    fn shape_frame_matches_the_formulas() {
        let t = 1234.0f64;
        let f = ShapeFrame::at(t);

        assert_relative_eq!(f.icosahedron_y, ((t * 0.002).sin() * 0.15) as f32, epsilon = 1e-6);
        assert_relative_eq!(f.torus_scale, (1.0 + 0.2 * (t * 0.003).sin()) as f32, epsilon = 1e-6);
        assert_relative_eq!(
            f.disc_opacity,
            (0.7 + 0.3 * (t * 0.0015).sin().abs()) as f32,
            epsilon = 1e-6
        );
        assert_relative_eq!(f.disc_y, (0.15 * (t * 0.0025).sin()) as f32, epsilon = 1e-6);
        assert_relative_eq!(f.disc_scale, (1.0 + 0.15 * (t * 0.004).sin()) as f32, epsilon = 1e-6);
    }

    #[test]
    fn opacity_stays_in_range() {
        for i in 0..500 {
            let f = ShapeFrame::at(i as f64 * 37.0);
            assert!((0.7..=1.0).contains(&f.disc_opacity));
        }
    }

    #[test]
    fn each_frame_advances_the_spins() {
        let mut demo = PrimitivesDemo::new();
        let mut renderer = DrawListRenderer::new();
        let mut clock = FrameClock::new();

        for _ in 0..10 {
            demo.update(&clock, None, &mut renderer).unwrap();
            clock.advance(1.0 / 60.0);
        }

        assert_relative_eq!(demo.icosahedron_rotation.y, 0.2, epsilon = 1e-5);
        assert_relative_eq!(demo.torus_rotation.x, 0.25, epsilon = 1e-5);
        assert_relative_eq!(demo.disc_rotation.x, FRAC_PI_2);
        assert_relative_eq!(demo.disc_rotation.z, 0.18, epsilon = 1e-5);
        assert_eq!(renderer.visuals().instance_count(), 3);

        let disc_opacity = demo
            .universe
            .assets
            .material(demo.disc_material)
            .unwrap()
            .opacity;
        assert!((0.7..=1.0).contains(&disc_opacity));
    }

    #[test]
    fn scene_has_three_lights_and_three_shapes() {
        let demo = PrimitivesDemo::new();
        let scene = &demo.universe().scene;

        assert_eq!(scene.len(), 6);
        let point = scene.find_by_name("point_light").unwrap();
        assert_eq!(
            scene.get(point).unwrap().transform.translation,
            Vec3::new(-2.0, 2.0, 2.0)
        );
        assert_eq!(demo.universe().camera.transform.translation.z, 3.0);
    }
}
