use std::sync::Arc;
use std::time::Instant;

use crate::engine::config::{SimulationSettings, WindowSettings};
use crate::engine::user_input::UserInput;
use crate::engine::xr::SimulatedSession;
use crate::engine::{AnimationLoop, EngineError, EngineResult};

use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

/// Viewer pitch with the cursor at the vertical center of the window.
const BASE_PITCH_DEGREES: f32 = -35.0;
/// Either case of `S` toggles the simulated session.
const SESSION_KEYS: [&str; 2] = ["s", "S"];
/// Yaw/pitch reached at the window edges.
const AIM_RANGE_DEGREES: (f32, f32) = (45.0, 25.0);

/// winit host (ApplicationHandler): redraw-driven, one `AnimationLoop::tick` per redraw.
///
/// Left click is the select gesture, `S` enters or leaves the simulated AR session and
/// the cursor aims the simulated viewer while a session runs.
pub struct Windowing;

impl Windowing {
    pub fn run_app(
        animation: AnimationLoop,
        window: WindowSettings,
        simulation: SimulationSettings,
    ) -> EngineResult<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = App {
            window: None,
            settings: window,
            simulation,
            animation,
            input: UserInput::new(),
            session: None,
            last_frame: None,
            error: None,
        };

        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct App {
    window: Option<Arc<Window>>,
    settings: WindowSettings,
    simulation: SimulationSettings,
    animation: AnimationLoop,
    input: UserInput,
    session: Option<SimulatedSession>,
    last_frame: Option<Instant>,
    /// First fatal error; the loop exits and `run_app` returns it.
    error: Option<EngineError>,
}

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: EngineError) {
        log::error!("{error}");
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn toggle_session(&mut self) {
        match self.session.take() {
            Some(mut session) => session.end(),
            None => {
                log::info!("entering simulated AR (press S again to leave)");
                self.session = Some(SimulatedSession::new(self.simulation.session_config()));
            }
        }
    }

    fn aim_viewer(&mut self) {
        let (Some(session), Some((x, y))) =
            (self.session.as_mut(), self.input.state().cursor_ndc())
        else {
            return;
        };
        let yaw = -x * AIM_RANGE_DEGREES.0.to_radians();
        let pitch = (BASE_PITCH_DEGREES + y * AIM_RANGE_DEGREES.1).to_radians();
        session.aim(yaw, pitch);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = self
            .last_frame
            .replace(now)
            .map(|prev| (now - prev).as_secs_f32())
            .unwrap_or(0.0);

        let toggle = SESSION_KEYS
            .iter()
            .any(|c| self.input.state().key_pressed(&Key::Character((*c).into())));
        if toggle {
            self.toggle_session();
        }

        self.aim_viewer();
        self.animation.handle_input(self.input.state());
        if self.input.state().button_pressed(MouseButton::Left) {
            self.animation.select();
        }
        self.input.begin_frame();

        let result = match self.session.as_mut() {
            Some(session) => {
                session.begin_frame();
                let mut frame = session.frame();
                self.animation.tick(dt, Some(&mut frame))
            }
            None => self.animation.tick(dt, None),
        };
        if let Err(e) = result {
            self.fail(event_loop, e);
            return;
        }

        if let Some(w) = &self.window {
            w.pre_present_notify();
            w.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs: WindowAttributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.width as f64,
                self.settings.height as f64,
            ));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, e.into());
                return;
            }
        };

        let size = window.inner_size();
        self.animation.resize(size.width, size.height);
        window.request_redraw();

        self.window = Some(window);
        self.last_frame = Some(Instant::now());
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::Resized(size) => {
                self.animation.resize(size.width, size.height);
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
