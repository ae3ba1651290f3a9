use crate::engine::assets::{AssetLoader, LoadEvent, LoadHandle};
use crate::engine::graphics::{RenderAssets, TextureData, TextureHandle};

const PLACEHOLDER: [u8; 4] = [128, 128, 128, 255];

/// Textures that are referenced before their pixels exist.
///
/// `request` hands out a handle to a 1×1 placeholder right away, so materials can be built
/// immediately; `flush_pending` swaps the decoded image in behind the same handle once the
/// load completes. A failed load keeps the placeholder.
#[derive(Debug, Default)]
pub struct TextureSlots {
    pending: Vec<(TextureHandle, LoadHandle<TextureData>)>,
}

impl TextureSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(
        &mut self,
        assets: &mut RenderAssets,
        loader: &dyn AssetLoader,
        url: &str,
    ) -> TextureHandle {
        let handle = assets.add_texture(TextureData::solid(PLACEHOLDER));
        self.pending.push((handle, loader.load_texture(url)));
        handle
    }

    #[cfg(test)]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Apply every load that finished since the last call.
    pub fn flush_pending(&mut self, assets: &mut RenderAssets) {
        self.pending.retain_mut(|(texture, load)| {
            for event in load.poll() {
                match event {
                    LoadEvent::Progress { .. } => {}
                    LoadEvent::Loaded(data) => {
                        log::debug!(
                            "texture {} ready ({}x{})",
                            load.url(),
                            data.width,
                            data.height
                        );
                        if !assets.replace_texture(*texture, data) {
                            log::debug!("texture {} was released before it loaded", load.url());
                        }
                    }
                    LoadEvent::Failed(e) => {
                        log::warn!("failed to load texture {}: {e}", load.url());
                    }
                }
            }
            !load.is_finished()
        });
    }
}

impl Drop for TextureSlots {
    fn drop(&mut self) {
        for (_, load) in &self.pending {
            load.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::AssetError;
    use crate::engine::assets::test_loader::ManualLoader;

    #[test]
    fn placeholder_is_replaced_in_place() {
        let loader = ManualLoader::default();
        let mut assets = RenderAssets::new();
        let mut slots = TextureSlots::new();

        let a = slots.request(&mut assets, &loader, "mem://a.png");
        let b = slots.request(&mut assets, &loader, "mem://b.png");
        assert_eq!(assets.texture(a), Some(&TextureData::solid(PLACEHOLDER)));
        assert_eq!(slots.pending_count(), 2);
        assert_eq!(loader.texture_urls(), ["mem://a.png", "mem://b.png"]);

        let pixels = TextureData {
            width: 2,
            height: 1,
            rgba: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        loader.complete_texture(0, Ok(pixels.clone()));
        slots.flush_pending(&mut assets);
        assert_eq!(assets.texture(a), Some(&pixels));
        assert_eq!(slots.pending_count(), 1);

        loader.complete_texture(1, Err(AssetError::Cancelled));
        slots.flush_pending(&mut assets);
        assert_eq!(assets.texture(b), Some(&TextureData::solid(PLACEHOLDER)));
        assert_eq!(slots.pending_count(), 0);
        assert_eq!(assets.texture_count(), 2);
    }
}
