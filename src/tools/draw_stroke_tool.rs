use egui::Pos2;
use log::debug;

use super::{Tool, ToolState};
use crate::command::Command;
use crate::element::Stroke;
use crate::scene::Scene;

/// Free-hand drawing. One pointer gesture is one stroke.
#[derive(Debug, Default)]
pub struct DrawStrokeTool {
    drawing: bool,
}

impl DrawStrokeTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for DrawStrokeTool {
    fn name(&self) -> &'static str {
        "DrawStroke"
    }

    fn on_pointer_down(&mut self, pos: Pos2, _scene: &Scene, state: &ToolState) -> Option<Command> {
        self.drawing = true;
        Some(Command::BeginStroke(Stroke::starting_at(pos, state.color, state.stroke_width)))
    }

    fn on_pointer_move(&mut self, pos: Pos2, scene: &Scene, _state: &ToolState) -> Option<Command> {
        if !self.drawing {
            return None;
        }
        scene
            .active_stroke()
            .map(|id| Command::ExtendStroke { id, point: pos })
    }

    fn on_pointer_up(&mut self, _pos: Pos2, scene: &Scene, _state: &ToolState) -> Option<Command> {
        self.deactivate(scene)
    }

    fn deactivate(&mut self, scene: &Scene) -> Option<Command> {
        if !std::mem::take(&mut self.drawing) {
            return None;
        }
        let id = scene.active_stroke()?;
        debug!("Finishing stroke {}", id);
        Some(Command::FinishStroke { id })
    }

    fn is_busy(&self) -> bool {
        self.drawing
    }
}
