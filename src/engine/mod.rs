pub mod animation_loop;
pub mod assets;
pub mod camera;
pub mod cli;
pub mod config;
pub mod demos;
pub mod graphics;
pub mod headless;
pub mod placement;
pub mod scene;
pub mod universe;
pub mod user_input;
pub mod windowing;
pub mod xr;

pub use animation_loop::{AnimationLoop, FrameClock};
pub use universe::Universe;

/// Engine-level error type.
///
/// Only host setup problems end up here; per-frame failures (session negotiation, asset
/// loads) are absorbed and logged where they happen.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Xr(#[from] xr::XrError),

    #[error(transparent)]
    Asset(#[from] assets::AssetError),
}

pub type EngineResult<T> = Result<T, EngineError>;
