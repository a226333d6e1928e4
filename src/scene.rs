//! The authoritative in-memory document of the editor.
//!
//! Objects live in an ordered arena of `Arc<SceneObject>`; the order is the
//! paint order (back to front). An id → index map gives direct lookup.
//! Snapshots are structural copies of the arena, so taking one per history
//! entry is cheap; mutating an object that a snapshot still shares clones
//! only that object.

use egui::{Color32, Pos2, Vec2};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::element::{BackgroundImage, Element, ObjectKind, SceneObject, Stroke};
use crate::error::{EditorError, EditorResult};
use crate::id_generator::{IdGenerator, ObjectId};

// Revisions are unique across all scenes, so a render cache can never
// confuse a replaced scene with the one it replaced.
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// Pixel size of the canvas. Both dimensions are at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Clamp a position to the nearest in-bounds coordinate.
    pub fn clamp(self, pos: Pos2) -> Pos2 {
        let x = if pos.x.is_nan() { 0.0 } else { pos.x };
        let y = if pos.y.is_nan() { 0.0 } else { pos.y };
        Pos2::new(x.clamp(0.0, self.width as f32), y.clamp(0.0, self.height as f32))
    }
}

/// Immutable copy of the scene content, as stored in the history.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    objects: Vec<Arc<SceneObject>>,
    background_color: Color32,
}

impl SceneSnapshot {
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().map(|o| o.as_ref())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn background_color(&self) -> Color32 {
        self.background_color
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    objects: Vec<Arc<SceneObject>>,
    index: HashMap<ObjectId, usize>,
    canvas_size: CanvasSize,
    background_color: Color32,
    ids: IdGenerator,
    active_stroke: Option<ObjectId>,
    revision: u64,
}

impl Scene {
    /// Create an empty scene
    pub fn new(canvas_size: CanvasSize, background_color: Color32) -> Self {
        Self {
            objects: Vec::new(),
            index: HashMap::new(),
            canvas_size,
            background_color,
            ids: IdGenerator::new(),
            active_stroke: None,
            revision: next_revision(),
        }
    }

    /// Rebuild a scene from stored objects, keeping their ids. `None` when the
    /// largest id leaves no room for new ones.
    pub(crate) fn from_objects(
        canvas_size: CanvasSize,
        background_color: Color32,
        objects: Vec<SceneObject>,
    ) -> Option<Self> {
        let mut scene = Self::new(canvas_size, background_color);
        scene.objects = objects.into_iter().map(Arc::new).collect();
        scene.rebuild_index();
        if let Some(max) = scene.objects.iter().map(|o| o.id()).max() {
            scene.ids = IdGenerator::starting_after(max)?;
        }
        Some(scene)
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas_size
    }

    pub fn background_color(&self) -> Color32 {
        self.background_color
    }

    /// Counter bumped on every mutation; renderers use it to invalidate caches.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All objects in paint order, back to front.
    pub fn list_objects(&self) -> impl DoubleEndedIterator<Item = &SceneObject> + ExactSizeIterator {
        self.objects.iter().map(|o| o.as_ref())
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.index.get(&id).map(|&i| self.objects[i].as_ref())
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index.contains_key(&id)
    }

    /// Id of the stroke currently being drawn, if any.
    pub fn active_stroke(&self) -> Option<ObjectId> {
        self.active_stroke
    }

    pub fn background_image(&self) -> Option<&BackgroundImage> {
        self.objects.iter().find_map(|o| o.kind().as_background())
    }

    /// Topmost selectable object under `pos`.
    pub fn hit_test(&self, pos: Pos2) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .find(|o| o.hit_test(pos))
            .map(|o| o.id())
    }

    /// Append a new object on top of the paint order.
    pub fn add_object(&mut self, kind: ObjectKind) -> ObjectId {
        let id = self.ids.generate();
        self.index.insert(id, self.objects.len());
        self.objects.push(Arc::new(SceneObject::new(id, kind)));
        self.touch();
        debug!("Added {} {}", self.objects[self.objects.len() - 1].element_type(), id);
        id
    }

    pub fn remove_object(&mut self, id: ObjectId) -> EditorResult<Arc<SceneObject>> {
        let index = *self.index.get(&id).ok_or(EditorError::NotFound(id))?;
        let removed = self.objects.remove(index);
        self.rebuild_index();
        if self.active_stroke == Some(id) {
            self.active_stroke = None;
        }
        self.touch();
        debug!("Removed {} {}", removed.element_type(), id);
        Ok(removed)
    }

    /// Remove every object and set the background color to `background_color`.
    /// Clearing an already clear scene is fine.
    pub fn clear(&mut self, background_color: Color32) {
        if self.is_clear(background_color) && self.active_stroke.is_none() {
            return;
        }
        self.objects.clear();
        self.index.clear();
        self.active_stroke = None;
        self.background_color = background_color;
        self.touch();
    }

    /// True when there are no objects and the background is `background_color`.
    pub fn is_clear(&self, background_color: Color32) -> bool {
        self.objects.is_empty() && self.background_color == background_color
    }

    /// Start a new stroke on top of the scene and mark it as being drawn.
    pub fn begin_stroke(&mut self, stroke: Stroke) -> ObjectId {
        if let Some(previous) = self.active_stroke.take() {
            debug!("Stroke {} finished implicitly by a new stroke", previous);
        }
        let id = self.add_object(ObjectKind::Stroke(stroke));
        self.active_stroke = Some(id);
        id
    }

    pub fn append_point_to_stroke(&mut self, id: ObjectId, point: Pos2) -> EditorResult<()> {
        let index = *self.index.get(&id).ok_or(EditorError::NotFound(id))?;
        if self.objects[index].kind().as_stroke().is_none() {
            return Err(EditorError::WrongVariant { id, expected: "a stroke" });
        }
        if self.active_stroke != Some(id) {
            return Err(EditorError::WrongVariant {
                id,
                expected: "the stroke being drawn",
            });
        }
        if let ObjectKind::Stroke(stroke) = Arc::make_mut(&mut self.objects[index]).kind_mut() {
            stroke.push_point(point);
        }
        self.touch();
        Ok(())
    }

    /// Finalize the active stroke; from now on it is an ordinary immutable object.
    pub fn finish_stroke(&mut self, id: ObjectId) -> EditorResult<()> {
        if self.active_stroke == Some(id) {
            self.active_stroke = None;
            return Ok(());
        }
        match self.get(id) {
            None => Err(EditorError::NotFound(id)),
            Some(_) => Err(EditorError::WrongVariant {
                id,
                expected: "the stroke being drawn",
            }),
        }
    }

    /// Put `image` in the background slot: bottom of the paint order,
    /// replacing any previous background image.
    pub fn set_background_image(&mut self, image: BackgroundImage) -> ObjectId {
        self.objects.retain(|o| !o.kind().is_background());
        let id = self.ids.generate();
        self.objects
            .insert(0, Arc::new(SceneObject::new(id, ObjectKind::BackgroundImage(image))));
        self.rebuild_index();
        self.touch();
        id
    }

    /// Move an object to `new_index` in the paint order (clamped to the end).
    pub fn reorder_object(&mut self, id: ObjectId, new_index: usize) -> EditorResult<()> {
        let index = *self.index.get(&id).ok_or(EditorError::NotFound(id))?;
        let object = self.objects.remove(index);
        let new_index = new_index.min(self.objects.len());
        self.objects.insert(new_index, object);
        self.rebuild_index();
        self.touch();
        Ok(())
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            objects: self.objects.clone(),
            background_color: self.background_color,
        }
    }

    /// Replace the content with `snapshot`. The id counter is not rewound.
    pub fn restore(&mut self, snapshot: SceneSnapshot) {
        self.objects = snapshot.objects;
        self.background_color = snapshot.background_color;
        self.rebuild_index();
        if let Some(max) = self.objects.iter().map(|o| o.id()).max() {
            self.ids.reserve_past(max);
        }
        self.active_stroke = None;
        self.touch();
    }

    /// Decode pixels of embedded background images (after deserialization).
    pub(crate) fn rehydrate_images(&mut self) {
        for object in &mut self.objects {
            if object.kind().is_background() {
                if let ObjectKind::BackgroundImage(image) = Arc::make_mut(object).kind_mut() {
                    image.rehydrate();
                }
            }
        }
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .objects
            .iter()
            .enumerate()
            .map(|(i, o)| (o.id(), i))
            .collect();
    }

    fn touch(&mut self) {
        self.revision = next_revision();
    }
}
