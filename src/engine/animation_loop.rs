use crate::engine::EngineResult;
use crate::engine::demos::Demo;
use crate::engine::graphics::SceneRenderer;
use crate::engine::user_input::InputState;
use crate::engine::xr::XrFrame;

/// Time as seen by a demo's per-frame callback.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    /// Milliseconds since the loop started.
    pub elapsed_ms: f64,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Frames completed before this one.
    pub frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the next frame, `dt` seconds after the current one.
    pub fn advance(&mut self, dt: f32) {
        self.frame_index += 1;
        self.dt = dt.max(0.0);
        self.elapsed_ms += f64::from(self.dt) * 1000.0;
    }
}

/// Host-agnostic frame driver: one demo, one renderer, one clock.
///
/// Both the window host and the headless host call `tick` once per display refresh;
/// gestures and input are forwarded between ticks.
pub struct AnimationLoop {
    demo: Box<dyn Demo>,
    renderer: Box<dyn SceneRenderer>,
    clock: FrameClock,
    started: bool,
}

impl AnimationLoop {
    pub fn new(demo: Box<dyn Demo>, renderer: Box<dyn SceneRenderer>) -> Self {
        Self {
            demo,
            renderer,
            clock: FrameClock::new(),
            started: false,
        }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn demo(&self) -> &dyn Demo {
        self.demo.as_ref()
    }

    /// Advance the clock and run one update of the demo.
    pub fn tick(&mut self, dt: f32, frame: Option<&mut dyn XrFrame>) -> EngineResult<()> {
        if self.started {
            self.clock.advance(dt);
        } else {
            self.started = true;
            log::info!("starting animation loop for demo '{}'", self.demo.name());
        }
        self.demo.update(&self.clock, frame, self.renderer.as_mut())
    }

    pub fn select(&mut self) {
        self.demo.select();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.demo.resize(width, height);
    }

    pub fn handle_input(&mut self, input: &InputState) {
        self.demo.handle_input(input);
    }
}
