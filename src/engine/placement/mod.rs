//! Hit-test-driven placement.
//!
//! `PlacementController` lazily binds a hit-test source once per immersive session, moves a
//! reticle onto the first hit every frame, and on "select" loads a model and drops it at
//! the reticle, releasing whatever was placed before.

pub mod reticle;


use glam::Vec3;

use crate::engine::assets::{AssetLoader, LoadEvent, LoadHandle, ModelAsset};
use crate::engine::graphics::{Material, MaterialHandle, SceneRenderer};
use crate::engine::scene::{NodeKey, Transform};
use crate::engine::xr::{
    HitTestSource, Pending, Pose, ReferenceSpace, ReferenceSpaceType, SessionEndSignal,
    SessionId, XrError, XrFrame,
};
use crate::engine::{EngineResult, Universe};

pub use reticle::{spawn_reticle, sync_reticle};

pub const DEFAULT_MODEL_URL: &str =
    "https://my-ar-models-bucket.s3.eu-north-1.amazonaws.com/MusicInstrument/scene.gltf";
pub const DEFAULT_MODEL_SCALE: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementConfig {
    pub model_url: String,
    /// Uniform scale applied to every placed model.
    pub model_scale: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            model_url: DEFAULT_MODEL_URL.to_string(),
            model_scale: DEFAULT_MODEL_SCALE,
        }
    }
}

/// Coarse view of the hit-test binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTestPhase {
    Idle,
    Pending,
    Ready,
}

/// What a select gesture did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// No reticle on screen; nothing happened.
    Ignored,
    Loading {
        /// A placed model was released first.
        replaced: bool,
        /// An unfinished load from an earlier gesture was cancelled.
        superseded: bool,
    },
}

/// The handshake is strictly ordered: viewer space, then a hit-test source on it, then the
/// local space poses are resolved in.
enum SetupStep {
    ViewerSpace(Pending<ReferenceSpace>),
    HitTestSource(Pending<HitTestSource>),
    LocalSpace {
        source: HitTestSource,
        pending: Pending<ReferenceSpace>,
    },
}

/// Source and local space exist together or not at all.
#[derive(Debug, Clone, Copy)]
struct HitTestBinding {
    session: SessionId,
    source: HitTestSource,
    local: ReferenceSpace,
}

enum HitTestState {
    Idle,
    Pending {
        session: SessionId,
        step: SetupStep,
    },
    Ready(HitTestBinding),
}

impl HitTestState {
    fn session(&self) -> Option<SessionId> {
        match self {
            HitTestState::Idle => None,
            HitTestState::Pending { session, .. } => Some(*session),
            HitTestState::Ready(binding) => Some(binding.session),
        }
    }
}

struct InFlightLoad {
    handle: LoadHandle<ModelAsset>,
    /// Reticle pose at gesture time.
    pose: Pose,
}

#[derive(Debug, Clone, Copy)]
struct PlacedModel {
    root: NodeKey,
    material: MaterialHandle,
}

/// Owns all placement state; the scene, resources and camera it works on are passed in.
///
/// Design:
/// - `on_frame` is the per-frame callback. Without a frame state it only renders.
/// - `dispatch_events` runs once per tick before `on_frame` and delivers what arrived
///   asynchronously since the last tick: session end and model load events.
/// - The placed-model slot holds at most one model, and the previous one is always
///   released before a new one is attached.
pub struct PlacementController {
    config: PlacementConfig,
    loader: Box<dyn AssetLoader>,

    state: HitTestState,
    end_signal: Option<SessionEndSignal>,

    reticle: NodeKey,
    reticle_visible: bool,
    reticle_pose: Option<Pose>,

    placed: Option<PlacedModel>,
    in_flight: Option<InFlightLoad>,
}

impl PlacementController {
    pub fn new(
        universe: &mut Universe,
        loader: Box<dyn AssetLoader>,
        config: PlacementConfig,
    ) -> Self {
        let reticle = spawn_reticle(universe);
        Self {
            config,
            loader,
            state: HitTestState::Idle,
            end_signal: None,
            reticle,
            reticle_visible: false,
            reticle_pose: None,
            placed: None,
            in_flight: None,
        }
    }

    pub fn phase(&self) -> HitTestPhase {
        match self.state {
            HitTestState::Idle => HitTestPhase::Idle,
            HitTestState::Pending { .. } => HitTestPhase::Pending,
            HitTestState::Ready(_) => HitTestPhase::Ready,
        }
    }

    pub fn is_source_initialized(&self) -> bool {
        self.phase() == HitTestPhase::Ready
    }

    #[cfg(test)]
    pub fn reticle(&self) -> NodeKey {
        self.reticle
    }

    pub fn reticle_visible(&self) -> bool {
        self.reticle_visible
    }

    #[cfg(test)]
    pub fn reticle_pose(&self) -> Option<Pose> {
        self.reticle_pose
    }

    pub fn placed_model(&self) -> Option<NodeKey> {
        self.placed.map(|p| p.root)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Per-frame callback.
    pub fn on_frame(
        &mut self,
        frame: Option<&mut dyn XrFrame>,
        universe: &mut Universe,
        renderer: &mut dyn SceneRenderer,
    ) -> EngineResult<()> {
        let Some(frame) = frame else {
            return universe.render(renderer);
        };

        if let Some(bound) = self.state.session() {
            if bound != frame.session_id() {
                log::info!(
                    "frame from session {:?} while bound to {:?}; rebinding",
                    frame.session_id(),
                    bound
                );
                self.on_session_end();
            }
        }

        self.initialize_hit_test_source(frame);

        if let HitTestState::Ready(binding) = self.state {
            self.update_reticle(frame, &binding);
        }
        sync_reticle(universe, self.reticle, self.reticle_visible, self.reticle_pose);

        universe.render(renderer)
    }

    /// Start or advance the viewer → hit-test source → local handshake.
    ///
    /// Issues the first request only from `Idle`; while a chain is pending, every step that
    /// has already resolved is consumed and the next request issued. A rejected step drops
    /// back to `Idle`, so the next frame starts over.
    fn initialize_hit_test_source(&mut self, frame: &mut dyn XrFrame) {
        let session = frame.session_id();

        let mut step = match std::mem::replace(&mut self.state, HitTestState::Idle) {
            HitTestState::Idle => {
                log::debug!(
                    "requesting {} reference space",
                    ReferenceSpaceType::Viewer.as_str()
                );
                let request = frame
                    .session()
                    .request_reference_space(ReferenceSpaceType::Viewer);
                self.state = HitTestState::Pending {
                    session,
                    step: SetupStep::ViewerSpace(request),
                };
                return;
            }
            ready @ HitTestState::Ready(_) => {
                self.state = ready;
                return;
            }
            HitTestState::Pending { step, .. } => step,
        };

        loop {
            step = match step {
                SetupStep::ViewerSpace(mut pending) => match pending.poll() {
                    None => return self.park(session, SetupStep::ViewerSpace(pending)),
                    Some(Ok(viewer)) => {
                        SetupStep::HitTestSource(frame.session().request_hit_test_source(&viewer))
                    }
                    Some(Err(e)) => return self.abandon_setup("viewer space", &e),
                },
                SetupStep::HitTestSource(mut pending) => match pending.poll() {
                    None => return self.park(session, SetupStep::HitTestSource(pending)),
                    Some(Ok(source)) => SetupStep::LocalSpace {
                        source,
                        pending: frame
                            .session()
                            .request_reference_space(ReferenceSpaceType::Local),
                    },
                    Some(Err(e)) => return self.abandon_setup("hit-test source", &e),
                },
                SetupStep::LocalSpace {
                    source,
                    mut pending,
                } => match pending.poll() {
                    None => return self.park(session, SetupStep::LocalSpace { source, pending }),
                    Some(Ok(local)) => {
                        let binding = HitTestBinding {
                            session,
                            source,
                            local,
                        };
                        return self.bind(frame, binding);
                    }
                    Some(Err(e)) => return self.abandon_setup("local space", &e),
                },
            };
        }
    }

    fn park(&mut self, session: SessionId, step: SetupStep) {
        self.state = HitTestState::Pending { session, step };
    }

    fn abandon_setup(&mut self, what: &str, error: &XrError) {
        log::warn!("hit-test setup failed at {what}: {error}; retrying next frame");
        self.state = HitTestState::Idle;
    }

    fn bind(&mut self, frame: &mut dyn XrFrame, binding: HitTestBinding) {
        log::info!("hit-test source ready for session {:?}", binding.session);
        self.end_signal = Some(frame.session().subscribe_end());
        self.state = HitTestState::Ready(binding);
    }

    fn update_reticle(&mut self, frame: &dyn XrFrame, binding: &HitTestBinding) {
        let hits = frame.hit_test_results(&binding.source);
        let pose = hits
            .first()
            .and_then(|hit| frame.resolve_pose(hit, &binding.local));

        match pose {
            Some(pose) => {
                self.reticle_visible = true;
                self.reticle_pose = Some(pose);
            }
            None => self.reticle_visible = false,
        }
    }

    /// Select gesture: release the placed model and start loading its replacement at the
    /// current reticle pose.
    pub fn on_select(&mut self, universe: &mut Universe) -> SelectOutcome {
        let (true, Some(pose)) = (self.reticle_visible, self.reticle_pose) else {
            return SelectOutcome::Ignored;
        };

        let replaced = self.release_placed_model(universe);

        let superseded = match self.in_flight.take() {
            Some(previous) => {
                log::info!("cancelling superseded load of {}", previous.handle.url());
                previous.handle.cancel();
                true
            }
            None => false,
        };

        let handle = self.loader.load_model(&self.config.model_url);
        self.in_flight = Some(InFlightLoad { handle, pose });

        SelectOutcome::Loading {
            replaced,
            superseded,
        }
    }

    /// Deliver session end and drain model load events.
    pub fn dispatch_events(&mut self, universe: &mut Universe) {
        let ended = self
            .end_signal
            .as_mut()
            .and_then(|signal| signal.poll_fired().then(|| signal.session()));
        if let Some(session) = ended {
            log::debug!("end notification from session {session:?}");
            self.on_session_end();
            sync_reticle(universe, self.reticle, self.reticle_visible, self.reticle_pose);
        }

        let Some(in_flight) = self.in_flight.as_mut() else {
            return;
        };
        let pose = in_flight.pose;
        let url = in_flight.handle.url().to_string();

        for event in in_flight.handle.poll() {
            match event {
                LoadEvent::Progress { .. } => {
                    if let Some(percent) = event.percent() {
                        log::debug!("{url}: {percent:.0}% loaded");
                    }
                }
                LoadEvent::Loaded(model) => {
                    self.in_flight = None;
                    self.attach(universe, &model, pose);
                    return;
                }
                LoadEvent::Failed(e) => {
                    self.in_flight = None;
                    log::error!("error loading model {url}: {e}");
                    return;
                }
            }
        }
    }

    /// Session ended: drop the binding so the next frame starts from scratch, and cancel
    /// any placement still loading.
    pub fn on_session_end(&mut self) {
        if let Some(session) = self.state.session() {
            log::info!("session {session:?} ended; hit-test source released");
        }
        self.state = HitTestState::Idle;
        self.end_signal = None;
        self.reticle_visible = false;

        if let Some(in_flight) = self.in_flight.take() {
            log::info!("cancelling load of {} (session ended)", in_flight.handle.url());
            in_flight.handle.cancel();
        }
    }

    fn attach(&mut self, universe: &mut Universe, model: &ModelAsset, pose: Pose) {
        self.release_placed_model(universe);

        let material = universe
            .assets
            .add_material(Material::chrome(universe.scene.environment));
        let root = model.instantiate(universe, material);
        if let Some(node) = universe.scene.get_mut(root) {
            node.transform = Transform {
                translation: pose.position,
                rotation: pose.orientation,
                scale: Vec3::splat(self.config.model_scale),
            };
        }

        self.placed = Some(PlacedModel { root, material });
        log::info!("Model added to scene at {}", pose.position);
    }

    fn release_placed_model(&mut self, universe: &mut Universe) -> bool {
        let Some(placed) = self.placed.take() else {
            return false;
        };

        let released = universe.dispose_subtree(placed.root);
        // Already gone when any mesh used it; still needed for mesh-less models.
        universe.assets.dispose_material(placed.material);
        log::debug!(
            "released placed model: {} nodes, {} meshes, {} materials",
            released.nodes,
            released.meshes,
            released.materials
        );
        true
    }
}
