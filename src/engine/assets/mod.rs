//! Asynchronous asset loading.
//!
//! Loads run off the frame thread and report back through a `LoadHandle`, which the frame
//! loop drains with `poll()`. Nothing here touches the scene; callers attach results
//! themselves once a `LoadEvent::Loaded` arrives.

pub mod gltf_import;
pub mod handle;
pub mod http_loader;
pub mod texture;
pub mod texture_slots;

#[cfg(test)]
pub mod test_loader;

pub use gltf_import::{ModelAsset, import_model};
pub use handle::{CancelToken, LoadEvent, LoadHandle, LoadReporter};
pub use http_loader::HttpAssetLoader;
pub use texture::decode_texture;
pub use texture_slots::TextureSlots;

use crate::engine::graphics::TextureData;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported asset: {0}")]
    Unsupported(String),

    #[error("load cancelled")]
    Cancelled,

    #[error("loader went away before reporting a result")]
    Disconnected,
}

/// Source of models and textures.
///
/// Both calls return immediately; the work continues in the background and is observed
/// through the returned handle.
pub trait AssetLoader {
    fn load_model(&self, url: &str) -> LoadHandle<ModelAsset>;

    fn load_texture(&self, url: &str) -> LoadHandle<TextureData>;
}
