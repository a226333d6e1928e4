use egui::{Pos2, Rect, Vec2};
use image::{ImageFormat, RgbaImage};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;

use super::Element;

/// Where a background image came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgroundSource {
    /// Reference handed out by the image-import collaborator
    Url(String),
    /// Raw encoded bytes (a dropped file, or a blob from the collaborator)
    Embedded { name: String, bytes: Vec<u8> },
}

impl BackgroundSource {
    pub fn label(&self) -> &str {
        match self {
            BackgroundSource::Url(url) => url,
            BackgroundSource::Embedded { name, .. } => name,
        }
    }
}

/// Background image element. Only the source reference is serialized; the
/// decoded pixels are rebuilt from embedded bytes after loading.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredBackground")]
pub struct BackgroundImage {
    source: BackgroundSource,
    position: Pos2,
    scale: f32,
    #[serde(skip)]
    raster: Option<Arc<RgbaImage>>,
}

#[derive(Deserialize)]
struct StoredBackground {
    source: BackgroundSource,
    position: Pos2,
    scale: f32,
}

impl From<StoredBackground> for BackgroundImage {
    fn from(stored: StoredBackground) -> Self {
        BackgroundImage::new(stored.source, None).with_placement(stored.position, stored.scale)
    }
}

// Custom Debug implementation so the pixel buffer is not dumped into logs
impl std::fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundImage")
            .field("source", &self.source.label())
            .field("position", &self.position)
            .field("scale", &self.scale)
            .field("raster", &self.raster.as_ref().map(|r| r.dimensions()))
            .finish()
    }
}

impl BackgroundImage {
    pub fn new(source: BackgroundSource, raster: Option<Arc<RgbaImage>>) -> Self {
        Self {
            source,
            position: Pos2::ZERO,
            scale: 1.0,
            raster,
        }
    }

    /// Place the image at `position`, drawn at `scale` times its pixel size.
    pub fn with_placement(mut self, position: Pos2, scale: f32) -> Self {
        self.position = position;
        self.scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        self
    }

    /// Scale so the whole image fits inside a canvas of `canvas_size`, anchored top-left.
    pub fn fitted_to(self, canvas_size: Vec2) -> Self {
        let Some((w, h)) = self.raster.as_ref().map(|r| r.dimensions()) else {
            return self;
        };
        if w == 0 || h == 0 {
            return self;
        }
        let scale = (canvas_size.x / w as f32).min(canvas_size.y / h as f32);
        self.with_placement(Pos2::ZERO, scale)
    }

    pub fn source(&self) -> &BackgroundSource {
        &self.source
    }

    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn raster(&self) -> Option<&RgbaImage> {
        self.raster.as_deref()
    }

    /// Size on the canvas in scene units (zero until pixels are available).
    pub fn size(&self) -> Vec2 {
        self.raster
            .as_ref()
            .map(|r| Vec2::new(r.width() as f32, r.height() as f32) * self.scale)
            .unwrap_or(Vec2::ZERO)
    }

    /// Copy of a URL-sourced image whose source carries its decoded pixels as
    /// PNG bytes, so a saved project does not depend on the URL staying
    /// readable. `None` when there is nothing to embed.
    pub(crate) fn embedded(&self) -> Option<Self> {
        let BackgroundSource::Url(url) = &self.source else {
            return None;
        };
        let raster = self.raster.as_ref()?;
        let mut cursor = Cursor::new(Vec::new());
        if let Err(err) = raster.write_to(&mut cursor, ImageFormat::Png) {
            warn!("Could not embed background {}: {}", url, err);
            return None;
        }
        Some(Self {
            source: BackgroundSource::Embedded {
                name: url.clone(),
                bytes: cursor.into_inner(),
            },
            ..self.clone()
        })
    }

    /// Decode embedded bytes again after deserialization.
    pub(crate) fn rehydrate(&mut self) {
        if self.raster.is_some() {
            return;
        }
        if let BackgroundSource::Embedded { name, bytes } = &self.source {
            match decode_image(bytes) {
                Ok(raster) => {
                    debug!("Rehydrated background {}: {}x{}", name, raster.width(), raster.height());
                    self.raster = Some(Arc::new(raster));
                }
                Err(err) => warn!("Failed to decode embedded background {}: {}", name, err),
            }
        }
    }
}

/// Decode any supported encoded image into RGBA pixels.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, image::ImageError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

impl Element for BackgroundImage {
    fn element_type(&self) -> &'static str {
        "background_image"
    }

    fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size())
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        self.rect().contains(pos)
    }
}
