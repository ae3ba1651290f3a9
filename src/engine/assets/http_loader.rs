use std::io::Read;
use std::thread;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;

use crate::engine::assets::{
    AssetError, AssetLoader, CancelToken, LoadHandle, LoadReporter, ModelAsset, decode_texture,
    import_model,
};
use crate::engine::graphics::TextureData;

const CHUNK_SIZE: usize = 64 * 1024;
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Loads assets over HTTP(S), or from disk for `file://` URLs.
///
/// Key points:
/// - one short-lived worker thread per request, blocking client inside it
/// - the body is streamed in chunks; progress is reported after every chunk
/// - cancellation is checked between chunks and between glTF buffers
/// - relative glTF buffer URIs are resolved against the model URL
#[derive(Debug, Clone)]
pub struct HttpAssetLoader {
    client: Client,
}

impl HttpAssetLoader {
    pub fn new() -> Result<Self, AssetError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn spawn<T, F>(&self, url: &str, what: &'static str, work: F) -> LoadHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&Client, &Url, &LoadReporter<T>) -> Result<T, AssetError> + Send + 'static,
    {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                let error = AssetError::InvalidUrl {
                    url: url.to_string(),
                    reason: e.to_string(),
                };
                return LoadHandle::failed(url, error);
            }
        };
        let (reporter, handle) = LoadHandle::channel(url);

        let client = self.client.clone();
        let spawned = thread::Builder::new()
            .name(format!("load-{what}"))
            .spawn(move || {
                log::debug!("loading {what} from {parsed}");
                let result = work(&client, &parsed, &reporter);
                if let Err(e) = &result {
                    log::debug!("{what} load from {parsed} ended early: {e}");
                }
                reporter.finish(result);
            });

        // The worker closure (and its reporter) is dropped on failure; the handle then
        // reports `Disconnected`.
        if let Err(e) = spawned {
            log::error!("could not start {what} loader thread: {e}");
        }
        handle
    }
}

impl AssetLoader for HttpAssetLoader {
    fn load_model(&self, url: &str) -> LoadHandle<ModelAsset> {
        self.spawn(url, "model", |client, url, reporter| {
            let cancel = reporter.cancel_token();
            let bytes = fetch(client, url, cancel, &|loaded, total| {
                reporter.progress(loaded, total)
            })?;

            import_model(&model_name(url), &bytes, |uri| {
                let buffer_url = resolve_uri(url, uri)?;
                fetch(client, &buffer_url, cancel, &|_, _| {})
            })
        })
    }

    fn load_texture(&self, url: &str) -> LoadHandle<TextureData> {
        self.spawn(url, "texture", |client, url, reporter| {
            let bytes = fetch(client, url, reporter.cancel_token(), &|loaded, total| {
                reporter.progress(loaded, total)
            })?;
            decode_texture(&bytes)
        })
    }
}

pub fn resolve_uri(base: &Url, uri: &str) -> Result<Url, AssetError> {
    base.join(uri).map_err(|e| AssetError::InvalidUrl {
        url: uri.to_string(),
        reason: e.to_string(),
    })
}

/// Last path segment, e.g. `scene.gltf`.
fn model_name(url: &Url) -> String {
    url.path_segments()
        .and_then(Iterator::last)
        .filter(|s| !s.is_empty())
        .unwrap_or("model")
        .to_string()
}

fn fetch(
    client: &Client,
    url: &Url,
    cancel: &CancelToken,
    on_progress: &dyn Fn(u64, Option<u64>),
) -> Result<Vec<u8>, AssetError> {
    if cancel.is_cancelled() {
        return Err(AssetError::Cancelled);
    }

    if url.scheme() == "file" {
        let path = url.to_file_path().map_err(|()| AssetError::InvalidUrl {
            url: url.to_string(),
            reason: "not a local path".into(),
        })?;
        let bytes = std::fs::read(path)?;
        on_progress(bytes.len() as u64, Some(bytes.len() as u64));
        return Ok(bytes);
    }

    let mut response = client.get(url.clone()).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(AssetError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0).min(MAX_PREALLOC) as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        if cancel.is_cancelled() {
            return Err(AssetError::Cancelled);
        }
        let n = response.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
        on_progress(body.len() as u64, total);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::engine::assets::LoadEvent;

    fn wait<T>(handle: &mut LoadHandle<T>) -> Vec<LoadEvent<T>> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut events = Vec::new();
        while !handle.is_finished() {
            assert!(Instant::now() < deadline, "load did not finish in time");
            events.extend(handle.poll());
            thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn buffer_uris_resolve_next_to_the_model() {
        let base = Url::parse("https://cdn.example.com/MusicInstrument/scene.gltf").unwrap();

        assert_eq!(
            resolve_uri(&base, "scene.bin").unwrap().as_str(),
            "https://cdn.example.com/MusicInstrument/scene.bin"
        );
        assert_eq!(
            resolve_uri(&base, "../shared/a%20b.bin").unwrap().as_str(),
            "https://cdn.example.com/shared/a%20b.bin"
        );
        assert_eq!(model_name(&base), "scene.gltf");
    }

    #[test]
    fn malformed_url_fails_without_a_thread() {
        let loader = HttpAssetLoader::new().unwrap();
        let mut handle = loader.load_model("not a url");

        let events = handle.poll();
        assert!(matches!(
            events.as_slice(),
            [LoadEvent::Failed(AssetError::InvalidUrl { .. })]
        ));
    }

    #[test]
    fn texture_from_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([255; 4]))
            .save(&path)
            .unwrap();

        let loader = HttpAssetLoader::new().unwrap();
        let url = Url::from_file_path(&path).unwrap();
        let mut handle = loader.load_texture(url.as_str());

        let events = wait(&mut handle);
        let Some(LoadEvent::Loaded(texture)) = events.last() else {
            panic!("expected a texture, got {events:?}");
        };
        assert_eq!((texture.width, texture.height), (4, 4));
        assert!(events.iter().any(|e| e.percent() == Some(100.0)));
    }

    #[test]
    fn missing_local_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("nope.glb")).unwrap();

        let loader = HttpAssetLoader::new().unwrap();
        let mut handle = loader.load_model(url.as_str());

        let events = wait(&mut handle);
        assert!(matches!(
            events.last(),
            Some(LoadEvent::Failed(AssetError::Io(_)))
        ));
    }
}
