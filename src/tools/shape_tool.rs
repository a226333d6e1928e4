use egui::{Color32, Pos2, Vec2};

use super::{Tool, ToolState};
use crate::command::Command;
use crate::config::EditorConfig;
use crate::element::{Ellipse, ObjectKind, Rectangle};
use crate::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
}

/// Sizes used when a shape is placed with a click instead of a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeDefaults {
    pub rectangle_size: Vec2,
    pub ellipse_radius: f32,
    pub drag_threshold: f32,
}

impl ShapeDefaults {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            rectangle_size: config.default_rectangle_size,
            ellipse_radius: config.default_ellipse_radius,
            drag_threshold: config.drag_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start: Pos2,
    current: Pos2,
}

impl Drag {
    fn is_click(&self, threshold: f32) -> bool {
        self.start.distance(self.current) < threshold
    }
}

/// Places rectangles or ellipses. A click places a default-sized shape
/// whose bounding box starts at the click; a drag sizes the shape and is
/// only committed on release.
#[derive(Debug)]
pub struct ShapeTool {
    kind: ShapeKind,
    defaults: ShapeDefaults,
    drag: Option<Drag>,
}

impl ShapeTool {
    pub fn new(kind: ShapeKind, defaults: ShapeDefaults) -> Self {
        Self {
            kind,
            defaults,
            drag: None,
        }
    }

    /// Default-sized shape with its bounding box top-left at `at`.
    pub fn default_object(&self, at: Pos2, color: Color32) -> ObjectKind {
        match self.kind {
            ShapeKind::Rectangle => {
                let size = self.defaults.rectangle_size;
                ObjectKind::Rectangle(Rectangle::new(at, size.x, size.y, color))
            }
            ShapeKind::Ellipse => {
                let r = self.defaults.ellipse_radius;
                ObjectKind::Ellipse(Ellipse::new(at + Vec2::splat(r), r, r, color))
            }
        }
    }

    fn dragged_object(&self, drag: &Drag, color: Color32) -> ObjectKind {
        match self.kind {
            ShapeKind::Rectangle => ObjectKind::Rectangle(Rectangle::from_corners(drag.start, drag.current, color)),
            ShapeKind::Ellipse => ObjectKind::Ellipse(Ellipse::inscribed(drag.start, drag.current, color)),
        }
    }
}

impl Tool for ShapeTool {
    fn name(&self) -> &'static str {
        match self.kind {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Ellipse => "Ellipse",
        }
    }

    fn on_pointer_down(&mut self, pos: Pos2, _scene: &Scene, _state: &ToolState) -> Option<Command> {
        self.drag = Some(Drag { start: pos, current: pos });
        None
    }

    fn on_pointer_move(&mut self, pos: Pos2, _scene: &Scene, _state: &ToolState) -> Option<Command> {
        if let Some(drag) = &mut self.drag {
            drag.current = pos;
        }
        None
    }

    fn on_pointer_up(&mut self, pos: Pos2, _scene: &Scene, state: &ToolState) -> Option<Command> {
        let mut drag = self.drag.take()?;
        drag.current = pos;
        let object = if drag.is_click(self.defaults.drag_threshold) {
            self.default_object(drag.start, state.color)
        } else {
            self.dragged_object(&drag, state.color)
        };
        Some(Command::AddObject(object))
    }

    fn deactivate(&mut self, _scene: &Scene) -> Option<Command> {
        // An unfinished drag is dropped, nothing was committed yet
        self.drag = None;
        None
    }

    fn is_busy(&self) -> bool {
        self.drag.is_some()
    }

    fn preview(&self, state: &ToolState) -> Option<ObjectKind> {
        let drag = self.drag.as_ref()?;
        if drag.is_click(self.defaults.drag_threshold) {
            return None;
        }
        Some(self.dragged_object(drag, state.color))
    }
}
