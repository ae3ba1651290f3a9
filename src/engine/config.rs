//! Application configuration.
//!
//! Every field has a default, so a config file only needs the keys it changes. CLI flags
//! are applied on top after loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::demos::DemoKind;
use crate::engine::placement::{DEFAULT_MODEL_SCALE, DEFAULT_MODEL_URL, PlacementConfig};
use crate::engine::xr::SimulatedSessionConfig;
use crate::engine::{EngineError, EngineResult};

const ENVIRONMENT_BASE_URL: &str = "https://threejs.org/examples/textures/cube/Bridge2/";
const SHOWCASE_BASE_URL: &str = "https://my-ar-models-bucket.s3.eu-north-1.amazonaws.com/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub demo: DemoKind,
    pub window: WindowSettings,
    pub placement: PlacementSettings,
    pub showcase: ShowcaseSettings,
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "AR placement".to_string(),
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    pub model_url: String,
    pub model_scale: f32,
    /// Prefix joined with each face file name.
    pub environment_base_url: String,
    /// +X, -X, +Y, -Y, +Z, -Z.
    pub environment_faces: [String; 6],
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            model_url: DEFAULT_MODEL_URL.to_string(),
            model_scale: DEFAULT_MODEL_SCALE,
            environment_base_url: ENVIRONMENT_BASE_URL.to_string(),
            environment_faces: ["posx", "negx", "posy", "negy", "posz", "negz"]
                .map(|face| format!("{face}.jpg")),
        }
    }
}

impl PlacementSettings {
    pub fn controller_config(&self) -> PlacementConfig {
        PlacementConfig {
            model_url: self.model_url.clone(),
            model_scale: self.model_scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowcaseSettings {
    pub model_url: String,
    pub base_color_url: String,
    pub normal_url: String,
    pub roughness_url: String,
    pub emissive_url: String,
}

impl Default for ShowcaseSettings {
    fn default() -> Self {
        let texture = |map: &str| {
            format!("{SHOWCASE_BASE_URL}textures/devil_dog_low_poly_1_default_{map}.png")
        };
        Self {
            model_url: format!("{SHOWCASE_BASE_URL}scene.gltf"),
            base_color_url: texture("baseColor"),
            normal_url: texture("normal"),
            roughness_url: texture("metallicRoughness"),
            emissive_url: texture("emissive"),
        }
    }
}

/// Scripted run used by `simulate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub frames: u64,
    /// Select on every K-th frame; `0` never selects.
    pub select_every: u64,
    /// End the session at this frame and start a fresh one.
    pub end_session_at: Option<u64>,
    /// Seconds per frame.
    pub fixed_dt: f32,
    pub floor_height: f32,
    pub max_distance: f32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        let session = SimulatedSessionConfig::default();
        Self {
            frames: 240,
            select_every: 60,
            end_session_at: None,
            fixed_dt: 1.0 / 60.0,
            floor_height: session.floor_height,
            max_distance: session.max_distance,
        }
    }
}

impl SimulationSettings {
    pub fn session_config(&self) -> SimulatedSessionConfig {
        SimulatedSessionConfig {
            floor_height: self.floor_height,
            max_distance: self.max_distance,
            ..SimulatedSessionConfig::default()
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid with the JSON file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        let config = match path {
            Some(path) => {
                log::info!("loading config from {}", path.display());
                let text = std::fs::read_to_string(path)?;
                Self::from_json(&text)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let fail = |msg: String| -> EngineResult<()> { Err(EngineError::Config(msg)) };

        if self.window.width == 0 || self.window.height == 0 {
            return fail(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            ));
        }
        if !(self.placement.model_scale.is_finite() && self.placement.model_scale > 0.0) {
            return fail(format!(
                "placement.model_scale must be positive, got {}",
                self.placement.model_scale
            ));
        }
        if self.placement.model_url.is_empty() {
            return fail("placement.model_url is empty".to_string());
        }
        if !(self.simulation.fixed_dt.is_finite() && self.simulation.fixed_dt > 0.0) {
            return fail(format!(
                "simulation.fixed_dt must be positive, got {}",
                self.simulation.fixed_dt
            ));
        }
        if !(self.simulation.max_distance.is_finite() && self.simulation.max_distance > 0.0) {
            return fail(format!(
                "simulation.max_distance must be positive, got {}",
                self.simulation.max_distance
            ));
        }
        if !self.simulation.floor_height.is_finite() {
            return fail(format!(
                "simulation.floor_height must be finite, got {}",
                self.simulation.floor_height
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_the_shipped_demos() {
        let config = AppConfig::default();

        assert_eq!(config.demo, DemoKind::Placement);
        assert_eq!(config.placement.model_scale, 0.01);
        assert_eq!(
            config.placement.environment_faces,
            ["posx.jpg", "negx.jpg", "posy.jpg", "negy.jpg", "posz.jpg", "negz.jpg"]
        );
        assert_eq!(
            config.showcase.model_url,
            "https://my-ar-models-bucket.s3.eu-north-1.amazonaws.com/scene.gltf"
        );
        assert!(config.showcase.roughness_url.ends_with("_metallicRoughness.png"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_named_keys() {
        let config = AppConfig::from_json(
            r#"{ "demo": "showcase", "placement": { "model_scale": 0.5 }, "simulation": { "end_session_at": 30 } }"#,
        )
        .unwrap();

        assert_eq!(config.demo, DemoKind::Showcase);
        assert_eq!(config.placement.model_scale, 0.5);
        assert_eq!(config.placement.model_url, DEFAULT_MODEL_URL);
        assert_eq!(config.simulation.end_session_at, Some(30));
        assert_eq!(config.simulation.frames, 240);
        assert_eq!(config.window, WindowSettings::default());
    }

    #[test]
    fn load_reads_file_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "window": {{ "width": 0 }} }}"#).unwrap();

        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));

        assert!(matches!(
            AppConfig::from_json("{ not json"),
            Err(EngineError::Json(_))
        ));
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn non_finite_simulation_settings_are_rejected() {
        let with = |edit: fn(&mut SimulationSettings)| {
            let mut config = AppConfig::default();
            edit(&mut config.simulation);
            config.validate()
        };

        assert!(matches!(with(|s| s.max_distance = f32::NAN), Err(EngineError::Config(_))));
        assert!(matches!(with(|s| s.max_distance = f32::INFINITY), Err(EngineError::Config(_))));
        assert!(matches!(with(|s| s.max_distance = 0.0), Err(EngineError::Config(_))));
        assert!(matches!(with(|s| s.floor_height = f32::NAN), Err(EngineError::Config(_))));
        assert!(matches!(
            with(|s| s.floor_height = f32::NEG_INFINITY),
            Err(EngineError::Config(_))
        ));
        assert!(with(|s| s.floor_height = -0.5).is_ok());
    }

    #[test]
    fn controller_config_carries_model_settings() {
        let mut settings = PlacementSettings::default();
        settings.model_url = "file:///tmp/chair.glb".into();

        let controller = settings.controller_config();
        assert_eq!(controller.model_url, "file:///tmp/chair.glb");
        assert_eq!(controller.model_scale, DEFAULT_MODEL_SCALE);
    }
}
