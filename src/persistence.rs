use egui::Color32;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::config::hex_color;
use crate::element::{BackgroundImage, ObjectKind, SceneObject};
use crate::scene::{CanvasSize, Scene};
use crate::util::time;

/// Current on-disk document format
pub const DOCUMENT_VERSION: u32 = 1;

const PROJECT_EXTENSION: &str = "json";

/// Errors that can occur while saving or loading project files
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize project: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to access project file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported project version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid project data: {0}")]
    InvalidDocument(String),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Serializable form of a scene.
///
/// Objects keep their ids and order, so loading a document rebuilds the
/// scene exactly; new ids continue past the largest stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub id: Uuid,
    pub version: u32,
    /// Seconds since the UNIX epoch
    #[serde(default)]
    pub saved_at: u64,
    #[serde(default)]
    pub app_version: String,
    pub canvas_size: CanvasSize,
    #[serde(with = "hex_color")]
    pub background_color: Color32,
    pub objects: Vec<SceneObject>,
}

impl SceneDocument {
    pub fn from_scene(id: Uuid, scene: &Scene) -> Self {
        Self {
            id,
            version: DOCUMENT_VERSION,
            saved_at: time::timestamp_secs(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            canvas_size: scene.canvas_size(),
            background_color: scene.background_color(),
            objects: scene.list_objects().map(storable).collect(),
        }
    }

    /// Rebuild the scene, decoding embedded background pixels. Documents whose
    /// object ids leave no room for new objects are rejected.
    pub fn into_scene(self) -> PersistenceResult<Scene> {
        if self.version > DOCUMENT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(self.version));
        }
        if self.app_version != env!("CARGO_PKG_VERSION") {
            warn!(
                "Project written by version {} (current {})",
                self.app_version,
                env!("CARGO_PKG_VERSION")
            );
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.objects.iter().find(|o| !seen.insert(o.id())) {
            return Err(PersistenceError::InvalidDocument(format!("duplicate object id {}", dup.id())));
        }
        let backgrounds: Vec<usize> = self
            .objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.kind().is_background())
            .map(|(i, _)| i)
            .collect();
        if backgrounds.len() > 1 || backgrounds.first().is_some_and(|&i| i != 0) {
            return Err(PersistenceError::InvalidDocument(
                "background image must be the single bottom object".into(),
            ));
        }

        let mut scene = Scene::from_objects(self.canvas_size, self.background_color, self.objects)
            .ok_or_else(|| PersistenceError::InvalidDocument("object ids exhausted".into()))?;
        scene.rehydrate_images();
        Ok(scene)
    }

    pub fn to_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PersistenceResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Backgrounds loaded from a URL are stored with their pixels, so reopening
/// the project does not need the URL to be reachable again.
fn storable(object: &SceneObject) -> SceneObject {
    match object.kind().as_background().and_then(BackgroundImage::embedded) {
        Some(image) => SceneObject::new(object.id(), ObjectKind::BackgroundImage(image)),
        None => object.clone(),
    }
}

/// Project files in one directory, one pretty-printed JSON file per project
#[derive(Debug, Clone)]
pub struct ProjectStore {
    dir: PathBuf,
}

impl ProjectStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, PROJECT_EXTENSION))
    }

    /// Write `document` as `<name>.json`, creating the directory if needed.
    pub fn save(&self, document: &SceneDocument, name: &str) -> PersistenceResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);
        fs::write(&path, document.to_json()?)?;
        info!("Saved project {} ({} objects) to {}", document.id, document.objects.len(), path.display());
        Ok(path)
    }

    pub fn load(&self, name: &str) -> PersistenceResult<SceneDocument> {
        let path = self.path_for(name);
        let json = fs::read_to_string(&path)?;
        let document = SceneDocument::from_json(&json)?;
        info!("Loaded project {} from {}", document.id, path.display());
        Ok(document)
    }

    /// Names of stored projects, sorted
    pub fn list(&self) -> PersistenceResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == PROJECT_EXTENSION))
            .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{factory, BackgroundImage, BackgroundSource};
    use egui::Pos2;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new(CanvasSize::new(320, 240), Color32::WHITE);
        scene.add_object(factory::create_rectangle(Pos2::new(10.0, 10.0), 50.0, 40.0, Color32::RED));
        scene.add_object(factory::create_stroke(
            vec![Pos2::new(1.0, 1.0), Pos2::new(5.0, 9.0)],
            Color32::BLUE,
            3.0,
        ));
        scene
    }

    #[test]
    fn document_rebuilds_scene() {
        let scene = sample_scene();
        let doc = SceneDocument::from_scene(Uuid::new_v4(), &scene);
        let json = doc.to_json().unwrap();
        let mut restored = SceneDocument::from_json(&json).unwrap().into_scene().unwrap();

        let before: Vec<_> = scene.list_objects().cloned().collect();
        let after: Vec<_> = restored.list_objects().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(restored.canvas_size(), CanvasSize::new(320, 240));

        let max = scene.list_objects().map(|o| o.id()).max().unwrap();
        let next = restored.add_object(factory::create_ellipse(Pos2::new(0.0, 0.0), 1.0, 1.0, Color32::RED));
        assert!(next > max);
    }

    #[test]
    fn embedded_background_is_decoded_on_load() {
        let mut cursor = Cursor::new(Vec::new());
        RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]))
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        let bytes = cursor.into_inner();
        let raster = crate::element::decode_image(&bytes).unwrap();
        let source = BackgroundSource::Embedded {
            name: "room.png".into(),
            bytes,
        };
        let mut scene = sample_scene();
        scene.set_background_image(BackgroundImage::new(source, Some(raster.into())));

        let json = SceneDocument::from_scene(Uuid::new_v4(), &scene).to_json().unwrap();
        let restored = SceneDocument::from_json(&json).unwrap().into_scene().unwrap();
        let background = restored.background_image().unwrap();
        assert_eq!(background.raster().unwrap().dimensions(), (3, 2));
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        RgbaImage::from_pixel(width, height, Rgba([200, 120, 40, 255]))
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    #[test]
    fn url_background_is_stored_with_its_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.png");
        std::fs::write(&path, png_bytes(4, 3)).unwrap();
        let url = format!("file://{}", path.display());
        let raster = crate::element::decode_image(&std::fs::read(&path).unwrap()).unwrap();

        let mut scene = sample_scene();
        scene.set_background_image(
            BackgroundImage::new(BackgroundSource::Url(url.clone()), Some(raster.into()))
                .with_placement(Pos2::new(5.0, 6.0), 2.0),
        );
        let json = SceneDocument::from_scene(Uuid::new_v4(), &scene).to_json().unwrap();

        // The photo may be gone by the time the project is reopened
        drop(dir);
        let restored = SceneDocument::from_json(&json).unwrap().into_scene().unwrap();
        let background = restored.background_image().unwrap();
        assert_eq!(background.raster().unwrap().dimensions(), (4, 3));
        assert_eq!(background.source().label(), url);
        assert_eq!(background.position(), Pos2::new(5.0, 6.0));
        assert_eq!(background.scale(), 2.0);
        assert_eq!(crate::render_scene(&restored).unwrap().data(), crate::render_scene(&scene).unwrap().data());
    }

    #[test]
    fn unloaded_url_background_stays_a_reference() {
        let mut scene = sample_scene();
        scene.set_background_image(BackgroundImage::new(BackgroundSource::Url("room-a.jpg".into()), None));
        let doc = SceneDocument::from_scene(Uuid::new_v4(), &scene);
        let background = doc.objects[0].kind().as_background().unwrap();
        assert_eq!(background.source(), &BackgroundSource::Url("room-a.jpg".into()));
    }

    #[test]
    fn largest_possible_id_is_rejected() {
        let json = SceneDocument::from_scene(Uuid::new_v4(), &sample_scene()).to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["objects"][0]["id"] = serde_json::json!(u64::MAX);
        let doc: SceneDocument = serde_json::from_value(value).unwrap();
        assert!(matches!(doc.into_scene(), Err(PersistenceError::InvalidDocument(_))));
    }

    #[test]
    fn out_of_range_attributes_are_clamped_on_load() {
        let json = SceneDocument::from_scene(Uuid::new_v4(), &sample_scene()).to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["objects"][0]["kind"]["Rectangle"]["width"] = serde_json::json!(-40.0);
        value["objects"][1]["kind"]["Stroke"]["width"] = serde_json::json!(0.0);
        let doc: SceneDocument = serde_json::from_value(value).unwrap();
        let scene = doc.into_scene().unwrap();

        let objects: Vec<_> = scene.list_objects().collect();
        assert_eq!(objects[0].kind().as_rectangle().unwrap().width(), 0.0);
        assert_eq!(objects[1].kind().as_stroke().unwrap().width(), crate::element::MIN_STROKE_WIDTH);
    }

    #[test]
    fn newer_versions_are_rejected() {
        let mut doc = SceneDocument::from_scene(Uuid::new_v4(), &sample_scene());
        doc.version = DOCUMENT_VERSION + 1;
        assert!(matches!(doc.into_scene(), Err(PersistenceError::UnsupportedVersion(_))));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut doc = SceneDocument::from_scene(Uuid::new_v4(), &sample_scene());
        let first = doc.objects[0].clone();
        doc.objects.push(first);
        assert!(matches!(doc.into_scene(), Err(PersistenceError::InvalidDocument(_))));
    }

    #[test]
    fn store_round_trip_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("projects"));
        assert!(store.list().unwrap().is_empty());

        let doc = SceneDocument::from_scene(Uuid::new_v4(), &sample_scene());
        let path = store.save(&doc, "living-room").unwrap();
        assert!(path.ends_with("living-room.json"));
        assert_eq!(store.list().unwrap(), vec!["living-room".to_string()]);
        assert_eq!(store.load("living-room").unwrap(), doc);
    }

    #[test]
    fn missing_project_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        assert!(matches!(store.load("nope"), Err(PersistenceError::IoError(_))));
    }
}
