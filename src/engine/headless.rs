//! Scripted run without a window: a simulated AR session, a yaw sweep and periodic selects.

use std::path::Path;

use crate::engine::config::SimulationSettings;
use crate::engine::scene::SceneSnapshot;
use crate::engine::xr::SimulatedSession;
use crate::engine::{AnimationLoop, EngineResult};

const SWEEP_PITCH_DEGREES: f32 = -35.0;
const SWEEP_AMPLITUDE: f32 = 0.6;
/// Radians of sweep phase per frame.
const SWEEP_RATE: f32 = 0.02;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub sessions: u32,
    pub selects: u32,
    /// Distinct models that ended up placed, including ones later replaced.
    pub placements: u32,
    pub scene_nodes: usize,
    /// A hit-test source was bound when the run stopped.
    pub hit_test_ready: bool,
    /// A model load was still in flight when the run stopped.
    pub loading: bool,
}

/// Viewer orientation for frame `i`: a slow side-to-side sweep at a fixed downward pitch.
pub fn sweep(i: u64) -> (f32, f32) {
    let yaw = SWEEP_AMPLITUDE * (i as f32 * SWEEP_RATE).sin();
    (yaw, SWEEP_PITCH_DEGREES.to_radians())
}

pub fn run(
    animation: &mut AnimationLoop,
    settings: &SimulationSettings,
    dump_scene: Option<&Path>,
) -> EngineResult<RunSummary> {
    let mut summary = RunSummary::default();
    let mut session = SimulatedSession::new(settings.session_config());
    summary.sessions = 1;
    let mut placed = None;

    for i in 0..settings.frames {
        if settings.end_session_at == Some(i) {
            session.end();
            session = SimulatedSession::new(settings.session_config());
            summary.sessions += 1;
        }

        let (yaw, pitch) = sweep(i);
        session.aim(yaw, pitch);
        session.begin_frame();
        {
            let mut frame = session.frame();
            animation.tick(settings.fixed_dt, Some(&mut frame))?;
        }
        summary.frames += 1;

        let now_placed = animation
            .demo()
            .placement()
            .and_then(|p| p.placed_model());
        if now_placed.is_some() && now_placed != placed {
            summary.placements += 1;
        }
        placed = now_placed;

        if settings.select_every > 0 && (i + 1) % settings.select_every == 0 {
            animation.select();
            summary.selects += 1;
        }
    }

    if let Some(controller) = animation.demo().placement() {
        summary.hit_test_ready = controller.is_source_initialized();
        summary.loading = controller.is_loading();
    }

    let scene = &animation.demo().universe().scene;
    summary.scene_nodes = scene.len();

    if let Some(path) = dump_scene {
        let snapshot = SceneSnapshot::capture(scene);
        snapshot.write_json(path)?;
        log::info!(
            "scene snapshot ({} nodes) written to {}",
            snapshot.node_count(),
            path.display()
        );
    }

    log::info!(
        "simulated {} frames: {} sessions, {} selects, {} placements, {} nodes (hit test ready: {}, loading: {})",
        summary.frames,
        summary.sessions,
        summary.selects,
        summary.placements,
        summary.scene_nodes,
        summary.hit_test_ready,
        summary.loading
    );
    Ok(summary)
}
