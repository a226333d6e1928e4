use egui::{Context, Key, Modifiers, PointerButton, Pos2, Rect};

use crate::scene::CanvasSize;

/// Pointer input in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Pos2 },
    PointerMove { pos: Pos2 },
    PointerUp { pos: Pos2 },
}

impl InputEvent {
    pub fn pos(&self) -> Pos2 {
        match self {
            InputEvent::PointerDown { pos } | InputEvent::PointerMove { pos } | InputEvent::PointerUp { pos } => *pos,
        }
    }

    /// Same event at another position
    pub fn with_pos(self, pos: Pos2) -> Self {
        match self {
            InputEvent::PointerDown { .. } => InputEvent::PointerDown { pos },
            InputEvent::PointerMove { .. } => InputEvent::PointerMove { pos },
            InputEvent::PointerUp { .. } => InputEvent::PointerUp { pos },
        }
    }
}

/// Editor actions bound to the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    DeleteSelected,
    Undo,
    Redo,
}

/// Map a key press to an editor action.
pub fn key_command(key: Key, modifiers: Modifiers) -> Option<KeyCommand> {
    match key {
        Key::Delete | Key::Backspace if !modifiers.command => Some(KeyCommand::DeleteSelected),
        Key::Z if modifiers.command && modifiers.shift => Some(KeyCommand::Redo),
        Key::Z if modifiers.command => Some(KeyCommand::Undo),
        Key::Y if modifiers.command => Some(KeyCommand::Redo),
        _ => None,
    }
}

/// Translates raw egui pointer state over the canvas widget into
/// [`InputEvent`]s in canvas coordinates.
///
/// A gesture starts only with a press inside the canvas; once started,
/// moves and the release are reported even outside it so the editor can
/// clamp them.
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    pressed: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while the primary button is held after a press on the canvas
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Convert a screen position to canvas coordinates for a canvas drawn into `canvas_rect`.
    pub fn to_canvas(screen: Pos2, canvas_rect: Rect, canvas_size: CanvasSize) -> Pos2 {
        let scale_x = canvas_size.width as f32 / canvas_rect.width().max(f32::EPSILON);
        let scale_y = canvas_size.height as f32 / canvas_rect.height().max(f32::EPSILON);
        let offset = screen - canvas_rect.min;
        Pos2::new(offset.x * scale_x, offset.y * scale_y)
    }

    /// Process this frame's pointer input.
    pub fn process_input(&mut self, ctx: &Context, canvas_rect: Rect, canvas_size: CanvasSize) -> Vec<InputEvent> {
        let mut events = Vec::new();
        ctx.input(|input| {
            let pointer = &input.pointer;
            let hover = pointer.interact_pos();

            if pointer.button_pressed(PointerButton::Primary) {
                if let Some(pos) = hover.filter(|p| canvas_rect.contains(*p)) {
                    self.pressed = true;
                    self.last_pointer_pos = Some(pos);
                    events.push(InputEvent::PointerDown {
                        pos: Self::to_canvas(pos, canvas_rect, canvas_size),
                    });
                }
            }

            if self.pressed {
                if let Some(pos) = hover.filter(|p| Some(*p) != self.last_pointer_pos) {
                    self.last_pointer_pos = Some(pos);
                    events.push(InputEvent::PointerMove {
                        pos: Self::to_canvas(pos, canvas_rect, canvas_size),
                    });
                }
            }

            if self.pressed && !pointer.button_down(PointerButton::Primary) {
                let pos = hover.or(self.last_pointer_pos).unwrap_or(canvas_rect.min);
                self.pressed = false;
                self.last_pointer_pos = None;
                events.push(InputEvent::PointerUp {
                    pos: Self::to_canvas(pos, canvas_rect, canvas_size),
                });
            }
        });
        events
    }

    /// Keyboard shortcuts pressed this frame.
    pub fn key_commands(ctx: &Context) -> Vec<KeyCommand> {
        ctx.input(|input| {
            input
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => key_command(*key, *modifiers),
                    _ => None,
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts() {
        let ctrl = Modifiers::COMMAND;
        let ctrl_shift = Modifiers::COMMAND | Modifiers::SHIFT;
        assert_eq!(key_command(Key::Delete, Modifiers::NONE), Some(KeyCommand::DeleteSelected));
        assert_eq!(key_command(Key::Backspace, Modifiers::NONE), Some(KeyCommand::DeleteSelected));
        assert_eq!(key_command(Key::Z, ctrl), Some(KeyCommand::Undo));
        assert_eq!(key_command(Key::Z, ctrl_shift), Some(KeyCommand::Redo));
        assert_eq!(key_command(Key::Y, ctrl), Some(KeyCommand::Redo));
        assert_eq!(key_command(Key::Z, Modifiers::NONE), None);
    }

    #[test]
    fn screen_to_canvas_scales() {
        let rect = Rect::from_min_size(Pos2::new(100.0, 50.0), egui::vec2(400.0, 300.0));
        let size = CanvasSize::new(800, 600);
        assert_eq!(InputHandler::to_canvas(Pos2::new(100.0, 50.0), rect, size), Pos2::ZERO);
        assert_eq!(InputHandler::to_canvas(Pos2::new(300.0, 200.0), rect, size), Pos2::new(400.0, 300.0));
    }

    #[test]
    fn event_position_helpers() {
        let down = InputEvent::PointerDown { pos: Pos2::new(1.0, 2.0) };
        assert_eq!(down.pos(), Pos2::new(1.0, 2.0));
        assert_eq!(down.with_pos(Pos2::ZERO), InputEvent::PointerDown { pos: Pos2::ZERO });
    }
}
