use egui::{Color32, Pos2};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::command::Command;
use crate::config::EditorConfig;
use crate::element::{ObjectKind, MIN_STROKE_WIDTH};
use crate::error::EditorResult;
use crate::palette::ColorChoice;
use crate::scene::Scene;

mod draw_stroke_tool;
mod selection_tool;
mod shape_tool;

pub use draw_stroke_tool::DrawStrokeTool;
pub use selection_tool::SelectionTool;
pub use shape_tool::{ShapeDefaults, ShapeKind, ShapeTool};

/// The interpretation mode applied to pointer input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolKind {
    #[default]
    Select,
    FreeDraw,
    PlaceRectangle,
    PlaceEllipse,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Select,
        ToolKind::FreeDraw,
        ToolKind::PlaceRectangle,
        ToolKind::PlaceEllipse,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ToolKind::Select => "Select",
            ToolKind::FreeDraw => "Draw",
            ToolKind::PlaceRectangle => "Rectangle",
            ToolKind::PlaceEllipse => "Circle",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current tool plus the drawing attributes used for new objects.
///
/// Owned by the caller and handed to the editor with every input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolState {
    pub tool: ToolKind,
    pub color: Color32,
    pub stroke_width: f32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl ToolState {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            tool: ToolKind::Select,
            color: config.default_color,
            stroke_width: config.default_stroke_width.max(MIN_STROKE_WIDTH),
        }
    }

    pub fn select_tool(&mut self, tool: ToolKind) {
        if self.tool != tool {
            log::info!("Tool selected: {}", tool);
            self.tool = tool;
        }
    }

    pub fn set_color(&mut self, choice: &ColorChoice) -> EditorResult<()> {
        self.color = choice.resolve()?;
        Ok(())
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = if width.is_nan() { MIN_STROKE_WIDTH } else { width.max(MIN_STROKE_WIDTH) };
    }
}

/// Tool trait defines the interface for all canvas tools.
///
/// Positions are in canvas coordinates and already clamped to the canvas.
pub trait Tool {
    /// Return the name of the tool
    fn name(&self) -> &'static str;

    /// Handle pointer press on the canvas.
    fn on_pointer_down(&mut self, pos: Pos2, scene: &Scene, state: &ToolState) -> Option<Command>;

    /// Handle pointer movement while the pointer is held down.
    fn on_pointer_move(&mut self, pos: Pos2, scene: &Scene, state: &ToolState) -> Option<Command>;

    /// Handle pointer release; returns the command that finalizes the gesture.
    fn on_pointer_up(&mut self, pos: Pos2, scene: &Scene, state: &ToolState) -> Option<Command>;

    /// Called when another tool takes over or the gesture must end early.
    /// Returns a command that finishes whatever was in progress.
    fn deactivate(&mut self, _scene: &Scene) -> Option<Command> {
        None
    }

    /// True while a pointer gesture is in progress
    fn is_busy(&self) -> bool {
        false
    }

    /// Render-only preview of an in-progress gesture; never part of the scene
    fn preview(&self, _state: &ToolState) -> Option<ObjectKind> {
        None
    }
}

/// One instance of every tool, so per-tool gesture state survives switching.
#[derive(Debug)]
pub struct ToolSet {
    select: SelectionTool,
    draw: DrawStrokeTool,
    rectangle: ShapeTool,
    ellipse: ShapeTool,
}

impl ToolSet {
    pub fn new(config: &EditorConfig) -> Self {
        let defaults = ShapeDefaults::from_config(config);
        Self {
            select: SelectionTool::new(),
            draw: DrawStrokeTool::new(),
            rectangle: ShapeTool::new(ShapeKind::Rectangle, defaults),
            ellipse: ShapeTool::new(ShapeKind::Ellipse, defaults),
        }
    }

    pub fn get(&self, kind: ToolKind) -> &dyn Tool {
        match kind {
            ToolKind::Select => &self.select,
            ToolKind::FreeDraw => &self.draw,
            ToolKind::PlaceRectangle => &self.rectangle,
            ToolKind::PlaceEllipse => &self.ellipse,
        }
    }

    pub fn get_mut(&mut self, kind: ToolKind) -> &mut dyn Tool {
        match kind {
            ToolKind::Select => &mut self.select,
            ToolKind::FreeDraw => &mut self.draw,
            ToolKind::PlaceRectangle => &mut self.rectangle,
            ToolKind::PlaceEllipse => &mut self.ellipse,
        }
    }

    /// The object a one-shot placement with `kind` would create, if `kind` places shapes.
    pub fn default_shape(&self, kind: ToolKind, at: Pos2, color: Color32) -> Option<ObjectKind> {
        match kind {
            ToolKind::PlaceRectangle => Some(self.rectangle.default_object(at, color)),
            ToolKind::PlaceEllipse => Some(self.ellipse.default_object(at, color)),
            ToolKind::Select | ToolKind::FreeDraw => None,
        }
    }
}
