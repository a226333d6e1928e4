use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};

mod common;
pub(crate) mod image;
pub(crate) mod shape;
pub(crate) mod stroke;

pub use common::{MIN_STROKE_WIDTH, STROKE_HIT_SLOP};
pub use self::image::{decode_image, BackgroundImage, BackgroundSource};
pub use shape::{Ellipse, Rectangle};
pub use stroke::Stroke;

use crate::id_generator::ObjectId;

/// Geometry shared by every kind of scene object
pub trait Element {
    /// Get the element type as a string
    fn element_type(&self) -> &'static str;

    /// Get the bounding rectangle for this element
    fn rect(&self) -> Rect;

    /// Test if the element contains the given position
    fn hit_test(&self, pos: Pos2) -> bool;
}

/// The drawable content of a scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Stroke(Stroke),
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    BackgroundImage(BackgroundImage),
}

impl ObjectKind {
    pub fn as_stroke(&self) -> Option<&Stroke> {
        match self {
            ObjectKind::Stroke(stroke) => Some(stroke),
            _ => None,
        }
    }

    pub fn as_rectangle(&self) -> Option<&Rectangle> {
        match self {
            ObjectKind::Rectangle(rect) => Some(rect),
            _ => None,
        }
    }

    pub fn as_ellipse(&self) -> Option<&Ellipse> {
        match self {
            ObjectKind::Ellipse(ellipse) => Some(ellipse),
            _ => None,
        }
    }

    pub fn as_background(&self) -> Option<&BackgroundImage> {
        match self {
            ObjectKind::BackgroundImage(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_background(&self) -> bool {
        matches!(self, ObjectKind::BackgroundImage(_))
    }
}

impl Element for ObjectKind {
    fn element_type(&self) -> &'static str {
        match self {
            ObjectKind::Stroke(s) => s.element_type(),
            ObjectKind::Rectangle(r) => r.element_type(),
            ObjectKind::Ellipse(e) => e.element_type(),
            ObjectKind::BackgroundImage(i) => i.element_type(),
        }
    }

    fn rect(&self) -> Rect {
        match self {
            ObjectKind::Stroke(s) => s.rect(),
            ObjectKind::Rectangle(r) => r.rect(),
            ObjectKind::Ellipse(e) => e.rect(),
            ObjectKind::BackgroundImage(i) => i.rect(),
        }
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        match self {
            ObjectKind::Stroke(s) => s.hit_test(pos),
            ObjectKind::Rectangle(r) => r.hit_test(pos),
            ObjectKind::Ellipse(e) => e.hit_test(pos),
            ObjectKind::BackgroundImage(i) => i.hit_test(pos),
        }
    }
}

/// One drawable element of a scene. Its position in the scene's object
/// list is its z-order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    id: ObjectId,
    selectable: bool,
    kind: ObjectKind,
}

impl SceneObject {
    /// Backgrounds are not selectable by default; everything else is.
    pub fn new(id: ObjectId, kind: ObjectKind) -> Self {
        let selectable = !kind.is_background();
        Self { id, selectable, kind }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn selectable(&self) -> bool {
        self.selectable
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut ObjectKind {
        &mut self.kind
    }
}

impl Element for SceneObject {
    fn element_type(&self) -> &'static str {
        self.kind.element_type()
    }

    fn rect(&self) -> Rect {
        self.kind.rect()
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        self.selectable && self.kind.hit_test(pos)
    }
}

/// Factory functions for creating elements
pub mod factory {
    use super::*;
    use egui::Color32;

    /// Create a new stroke element
    pub fn create_stroke(points: Vec<Pos2>, color: Color32, width: f32) -> ObjectKind {
        ObjectKind::Stroke(Stroke::new(points, color, width))
    }

    /// Create a new rectangle element
    pub fn create_rectangle(position: Pos2, width: f32, height: f32, fill: Color32) -> ObjectKind {
        ObjectKind::Rectangle(Rectangle::new(position, width, height, fill))
    }

    /// Create a new ellipse element
    pub fn create_ellipse(center: Pos2, radius_x: f32, radius_y: f32, fill: Color32) -> ObjectKind {
        ObjectKind::Ellipse(Ellipse::new(center, radius_x, radius_y, fill))
    }
}
