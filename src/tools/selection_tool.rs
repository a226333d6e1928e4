use egui::Pos2;

use super::{Tool, ToolState};
use crate::command::Command;
use crate::scene::Scene;

/// Single selection: the last pointer-down decides what is selected.
#[derive(Debug, Default)]
pub struct SelectionTool;

impl SelectionTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for SelectionTool {
    fn name(&self) -> &'static str {
        "Selection"
    }

    fn on_pointer_down(&mut self, pos: Pos2, scene: &Scene, _state: &ToolState) -> Option<Command> {
        Some(Command::SetSelection(scene.hit_test(pos)))
    }

    fn on_pointer_move(&mut self, _pos: Pos2, _scene: &Scene, _state: &ToolState) -> Option<Command> {
        None
    }

    fn on_pointer_up(&mut self, _pos: Pos2, _scene: &Scene, _state: &ToolState) -> Option<Command> {
        None
    }
}
