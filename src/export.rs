//! Encoding the rendered canvas into downloadable image files.

use futures::channel::oneshot;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{info, warn};
use std::fmt;
use std::io::Cursor;

use crate::error::{EditorError, EditorResult};
use crate::renderer::{pixmap_to_rgba, render_scene};
use crate::scene::Scene;
use crate::util::time;

const FILENAME_PREFIX: &str = "staged-room-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg { quality: u8 },
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Png => f.write_str("PNG"),
            ExportFormat::Jpeg { quality } => write!(f, "JPEG (quality {})", quality),
        }
    }
}

/// Encoded image plus the name it should be saved under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub format: ExportFormat,
}

/// Hands out `staged-room-<millis>.<ext>` names whose token never repeats
/// or goes backwards within a session, even when the clock stalls.
#[derive(Debug, Default)]
pub struct FilenameGenerator {
    last_token: Option<u64>,
}

impl FilenameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_token(&mut self, now_millis: u64) -> u64 {
        let token = match self.last_token {
            Some(last) if now_millis <= last => last + 1,
            _ => now_millis,
        };
        self.last_token = Some(token);
        token
    }

    pub fn next_filename(&mut self, format: ExportFormat) -> String {
        let token = self.next_token(time::timestamp_millis());
        format!("{}{}.{}", FILENAME_PREFIX, token, format.extension())
    }
}

/// Rasterize the scene and encode it. The scene is only read.
pub fn encode_scene(scene: &Scene, format: ExportFormat) -> EditorResult<Vec<u8>> {
    encode_rgba(rasterize(scene)?, format)
}

fn rasterize(scene: &Scene) -> EditorResult<RgbaImage> {
    let size = scene.canvas_size();
    let pixmap = render_scene(scene).ok_or_else(|| {
        EditorError::ExportFailed(format!("cannot allocate a {}x{} canvas", size.width, size.height))
    })?;
    pixmap_to_rgba(&pixmap).ok_or_else(|| EditorError::ExportFailed("pixel buffer size mismatch".into()))
}

/// Encode straight-alpha pixels into `format`.
pub fn encode_rgba(image: RgbaImage, format: ExportFormat) -> EditorResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    let result = match format {
        ExportFormat::Png => DynamicImage::ImageRgba8(image).write_to(&mut cursor, ImageFormat::Png),
        ExportFormat::Jpeg { quality } => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
            JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100)).encode_image(&rgb)
        }
    };
    result.map_err(|err| {
        warn!("Encoding {} failed: {}", format, err);
        EditorError::ExportFailed(err.to_string())
    })?;
    Ok(cursor.into_inner())
}

/// Produces export files for the editor.
#[derive(Debug, Default)]
pub struct ExportService {
    filenames: FilenameGenerator,
}

impl ExportService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export_raster(&mut self, scene: &Scene, format: ExportFormat) -> EditorResult<ExportedImage> {
        let bytes = encode_scene(scene, format)?;
        let filename = self.filenames.next_filename(format);
        info!("Exported {} ({} bytes) as {}", format, bytes.len(), filename);
        Ok(ExportedImage {
            bytes,
            filename,
            format,
        })
    }

    /// Rasterize now and encode on a worker thread (a local task on wasm).
    ///
    /// The receiver resolves once encoding finishes; dropping it discards the result.
    pub fn export_in_background(
        &mut self,
        scene: &Scene,
        format: ExportFormat,
    ) -> oneshot::Receiver<EditorResult<ExportedImage>> {
        let (sender, receiver) = oneshot::channel();
        let filename = self.filenames.next_filename(format);
        let pixels = match rasterize(scene) {
            Ok(pixels) => pixels,
            Err(err) => {
                let _ = sender.send(Err(err));
                return receiver;
            }
        };

        let job = move || {
            let result = encode_rgba(pixels, format).map(|bytes| {
                info!("Exported {} ({} bytes) as {}", format, bytes.len(), filename);
                ExportedImage {
                    bytes,
                    filename,
                    format,
                }
            });
            if sender.send(result).is_err() {
                warn!("Export finished but nobody was waiting for it");
            }
        };

        // A failed spawn drops the sender, which the receiver sees as cancellation
        #[cfg(not(target_arch = "wasm32"))]
        {
            let spawned = std::thread::Builder::new().name("export-encoder".into()).spawn(job);
            if let Err(err) = spawned {
                warn!("Could not start export worker: {}", err);
            }
        }

        // No threads on the web: encode on the next turn of the browser's event loop
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move { job() });

        receiver
    }
}
