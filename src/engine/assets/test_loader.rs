//! In-memory `AssetLoader` for tests: nothing completes until the test says so.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::assets::{AssetError, AssetLoader, LoadHandle, LoadReporter, ModelAsset};
use crate::engine::graphics::TextureData;

type Requests<T> = Rc<RefCell<Vec<(String, Option<LoadReporter<T>>)>>>;

#[derive(Clone, Default)]
pub struct ManualLoader {
    models: Requests<ModelAsset>,
    textures: Requests<TextureData>,
}

impl ManualLoader {
    pub fn model_requests(&self) -> usize {
        self.models.borrow().len()
    }

    pub fn texture_urls(&self) -> Vec<String> {
        self.textures.borrow().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn model_url(&self, index: usize) -> String {
        self.models.borrow()[index].0.clone()
    }

    pub fn complete_model(&self, index: usize, result: Result<ModelAsset, AssetError>) {
        finish(&self.models, index, result);
    }

    pub fn complete_texture(&self, index: usize, result: Result<TextureData, AssetError>) {
        finish(&self.textures, index, result);
    }

    /// Whether the consumer cancelled a still-open model request.
    pub fn model_cancelled(&self, index: usize) -> bool {
        self.models.borrow()[index]
            .1
            .as_ref()
            .is_some_and(LoadReporter::is_cancelled)
    }
}

fn open<T>(requests: &Requests<T>, url: &str) -> LoadHandle<T> {
    let (reporter, handle) = LoadHandle::channel(url);
    requests.borrow_mut().push((url.to_string(), Some(reporter)));
    handle
}

fn finish<T>(requests: &Requests<T>, index: usize, result: Result<T, AssetError>) {
    let reporter = requests.borrow_mut()[index]
        .1
        .take()
        .expect("request already completed");
    reporter.progress(50, Some(100));
    reporter.finish(result);
}

impl AssetLoader for ManualLoader {
    fn load_model(&self, url: &str) -> LoadHandle<ModelAsset> {
        open(&self.models, url)
    }

    fn load_texture(&self, url: &str) -> LoadHandle<TextureData> {
        open(&self.textures, url)
    }
}
