//! Loading room photos into the background slot.
//!
//! Fetching and decoding run off the UI path. Every request gets a sequence
//! number and only the newest request may change the scene, so a slow
//! earlier load can never overwrite a later choice.

use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::element::{decode_image, BackgroundImage, BackgroundSource};
use crate::error::{EditorError, EditorResult};

/// Ordered list of images the user can pick a background from.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    sources: Vec<BackgroundSource>,
}

impl ImageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source; returns its index. A source already listed is not duplicated.
    pub fn add(&mut self, source: BackgroundSource) -> usize {
        if let Some(index) = self.sources.iter().position(|s| *s == source) {
            return index;
        }
        debug!("Catalog entry added: {}", source.label());
        self.sources.push(source);
        self.sources.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&BackgroundSource> {
        self.sources.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackgroundSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Resolves a source to encoded image bytes.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, source: &BackgroundSource) -> BoxFuture<'static, Result<Vec<u8>, String>>;
}

/// Reads embedded bytes directly and treats URLs as local file paths
/// (`file://` prefix optional).
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFetcher;

impl ImageFetcher for LocalFetcher {
    fn fetch(&self, source: &BackgroundSource) -> BoxFuture<'static, Result<Vec<u8>, String>> {
        match source {
            BackgroundSource::Embedded { bytes, .. } => {
                let bytes = bytes.clone();
                async move { Ok(bytes) }.boxed()
            }
            BackgroundSource::Url(url) => {
                let path = url.strip_prefix("file://").unwrap_or(url).to_owned();
                async move { std::fs::read(&path).map_err(|err| format!("{}: {}", path, err)) }.boxed()
            }
        }
    }
}

/// A background load the editor asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub seq: u64,
    pub source: BackgroundSource,
}

/// Outcome of fetching and decoding one request.
#[derive(Debug)]
pub struct LoadResult {
    pub seq: u64,
    pub result: Result<BackgroundImage, String>,
}

/// Completed loads waiting to be picked up by the UI thread.
pub type LoadInbox = Arc<Mutex<Vec<LoadResult>>>;

/// Last-request-wins bookkeeping for background loads.
#[derive(Debug, Default)]
pub struct BackgroundLoader {
    latest: u64,
    pending: Option<u64>,
}

impl BackgroundLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new load; any older request still in flight becomes stale.
    pub fn request(&mut self, source: BackgroundSource) -> LoadRequest {
        self.latest += 1;
        self.pending = Some(self.latest);
        info!("Background load #{} requested: {}", self.latest, source.label());
        LoadRequest {
            seq: self.latest,
            source,
        }
    }

    /// Fetch and decode a request. Does not touch loader state.
    pub fn load(fetcher: &dyn ImageFetcher, request: LoadRequest) -> BoxFuture<'static, LoadResult> {
        let fetch = fetcher.fetch(&request.source);
        async move {
            let result = match fetch.await {
                Ok(bytes) => decode_image(&bytes)
                    .map(|raster| BackgroundImage::new(request.source.clone(), Some(Arc::new(raster))))
                    .map_err(|err| format!("{}: {}", request.source.label(), err)),
                Err(err) => Err(err),
            };
            LoadResult {
                seq: request.seq,
                result,
            }
        }
        .boxed()
    }

    /// Accept a finished load.
    ///
    /// Returns `Ok(None)` for stale results, which are dropped. A failure of
    /// the newest request is reported as [`EditorError::BackgroundLoadFailed`].
    pub fn complete(&mut self, result: LoadResult) -> EditorResult<Option<BackgroundImage>> {
        if result.seq != self.latest {
            debug!(
                "Discarding stale background load #{} (latest is #{})",
                result.seq, self.latest
            );
            return Ok(None);
        }
        self.pending = None;
        match result.result {
            Ok(image) => {
                info!("Background load #{} finished: {}", result.seq, image.source().label());
                Ok(Some(image))
            }
            Err(reason) => {
                warn!("Background load #{} failed: {}", result.seq, reason);
                Err(EditorError::BackgroundLoadFailed(reason))
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Run a load off the UI thread and post its result into `inbox`.
    pub fn spawn_load(fetcher: Arc<dyn ImageFetcher>, request: LoadRequest, inbox: LoadInbox) {
        let task = Self::load(fetcher.as_ref(), request);
        let deliver = async move {
            let result = task.await;
            inbox.lock().push(result);
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let spawned = std::thread::Builder::new()
                .name("background-loader".into())
                .spawn(move || futures::executor::block_on(deliver));
            if let Err(err) = spawned {
                warn!("Could not start background loader: {}", err);
            }
        }

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(deliver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]))
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn embedded(name: &str, w: u32, h: u32) -> BackgroundSource {
        BackgroundSource::Embedded {
            name: name.into(),
            bytes: png_bytes(w, h),
        }
    }

    #[test]
    fn catalog_keeps_order_and_skips_duplicates() {
        let mut catalog = ImageCatalog::new();
        assert_eq!(catalog.add(BackgroundSource::Url("a.png".into())), 0);
        assert_eq!(catalog.add(BackgroundSource::Url("b.png".into())), 1);
        assert_eq!(catalog.add(BackgroundSource::Url("a.png".into())), 0);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1), Some(&BackgroundSource::Url("b.png".into())));
    }

    #[test]
    fn newest_request_wins() {
        let mut loader = BackgroundLoader::new();
        let first = loader.request(embedded("first", 4, 4));
        let second = loader.request(embedded("second", 8, 8));

        let second_done = block_on(BackgroundLoader::load(&LocalFetcher, second));
        let first_done = block_on(BackgroundLoader::load(&LocalFetcher, first));

        let image = loader.complete(second_done).unwrap().unwrap();
        assert_eq!(image.raster().unwrap().dimensions(), (8, 8));
        assert!(!loader.is_pending());
        assert!(loader.complete(first_done).unwrap().is_none());
    }

    #[test]
    fn failed_load_is_reported() {
        let mut loader = BackgroundLoader::new();
        let request = loader.request(BackgroundSource::Embedded {
            name: "junk".into(),
            bytes: vec![1, 2, 3],
        });
        let done = block_on(BackgroundLoader::load(&LocalFetcher, request));
        assert!(matches!(loader.complete(done), Err(EditorError::BackgroundLoadFailed(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let mut loader = BackgroundLoader::new();
        let request = loader.request(BackgroundSource::Url("file:///definitely/not/here.png".into()));
        let done = block_on(BackgroundLoader::load(&LocalFetcher, request));
        assert!(matches!(loader.complete(done), Err(EditorError::BackgroundLoadFailed(_))));
    }

    #[test]
    fn spawned_load_arrives_in_inbox() {
        let mut loader = BackgroundLoader::new();
        let inbox: LoadInbox = Arc::default();
        let request = loader.request(embedded("room", 2, 3));
        BackgroundLoader::spawn_load(Arc::new(LocalFetcher), request, inbox.clone());

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while inbox.lock().is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let result = inbox.lock().pop().unwrap();
        let image = loader.complete(result).unwrap().unwrap();
        assert_eq!(image.raster().unwrap().dimensions(), (2, 3));
    }
}
