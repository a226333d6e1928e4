use egui::{Color32, Pos2};

use crate::element::{BackgroundImage, ObjectKind, Stroke};
use crate::error::EditorResult;
use crate::id_generator::ObjectId;
use crate::scene::Scene;

/// Scene mutations emitted by tools and user actions.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Place a finished shape on top of the scene
    AddObject(ObjectKind),
    /// Start a free-hand stroke (opens a gesture)
    BeginStroke(Stroke),
    /// Append a point to the stroke being drawn
    ExtendStroke { id: ObjectId, point: Pos2 },
    /// Finalize the stroke being drawn (closes the gesture)
    FinishStroke { id: ObjectId },
    /// Delete one object
    RemoveObject(ObjectId),
    /// Put an image into the background slot
    SetBackground(BackgroundImage),
    /// Remove everything and reset the background color
    Clear { background_color: Color32 },
    /// Change the current selection; does not touch the scene
    SetSelection(Option<ObjectId>),
}

/// How a command interacts with the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Not a scene mutation
    Untracked,
    /// One entry, committed when the command succeeds
    Commit,
    /// Snapshot is taken now and committed when the gesture closes
    OpenGesture,
    /// Part of an open gesture, no entry of its own
    WithinGesture,
    /// Commits the snapshot taken when the gesture opened
    CloseGesture,
}

/// What executing a command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Created(ObjectId),
    Removed(ObjectId),
    Changed,
    Unchanged,
    Selected(Option<ObjectId>),
}

impl CommandOutcome {
    /// Id of the object the command created, if any
    pub fn created(self) -> Option<ObjectId> {
        match self {
            CommandOutcome::Created(id) => Some(id),
            _ => None,
        }
    }
}

impl Command {
    pub fn history_policy(&self) -> HistoryPolicy {
        match self {
            Command::AddObject(_)
            | Command::RemoveObject(_)
            | Command::SetBackground(_)
            | Command::Clear { .. } => HistoryPolicy::Commit,
            Command::BeginStroke(_) => HistoryPolicy::OpenGesture,
            Command::ExtendStroke { .. } => HistoryPolicy::WithinGesture,
            Command::FinishStroke { .. } => HistoryPolicy::CloseGesture,
            Command::SetSelection(_) => HistoryPolicy::Untracked,
        }
    }

    /// Label used for the history entry this command produces
    pub fn label(&self) -> &'static str {
        match self {
            Command::AddObject(ObjectKind::Rectangle(_)) => "Add Rectangle",
            Command::AddObject(ObjectKind::Ellipse(_)) => "Add Ellipse",
            Command::AddObject(_) => "Add Object",
            Command::BeginStroke(_) | Command::ExtendStroke { .. } | Command::FinishStroke { .. } => {
                "Draw Stroke"
            }
            Command::RemoveObject(_) => "Delete",
            Command::SetBackground(_) => "Set Background",
            Command::Clear { .. } => "Clear",
            Command::SetSelection(_) => "Select",
        }
    }

    /// Apply the command to the scene. On error the scene is unchanged.
    pub fn execute(&self, scene: &mut Scene) -> EditorResult<CommandOutcome> {
        match self {
            Command::AddObject(kind) => Ok(CommandOutcome::Created(scene.add_object(kind.clone()))),
            Command::BeginStroke(stroke) => Ok(CommandOutcome::Created(scene.begin_stroke(stroke.clone()))),
            Command::ExtendStroke { id, point } => {
                scene.append_point_to_stroke(*id, *point)?;
                Ok(CommandOutcome::Changed)
            }
            Command::FinishStroke { id } => {
                scene.finish_stroke(*id)?;
                Ok(CommandOutcome::Unchanged)
            }
            Command::RemoveObject(id) => {
                scene.remove_object(*id)?;
                Ok(CommandOutcome::Removed(*id))
            }
            Command::SetBackground(image) => Ok(CommandOutcome::Created(
                scene.set_background_image(image.clone()),
            )),
            Command::Clear { background_color } => {
                if scene.is_clear(*background_color) {
                    return Ok(CommandOutcome::Unchanged);
                }
                scene.clear(*background_color);
                Ok(CommandOutcome::Changed)
            }
            Command::SetSelection(selection) => Ok(CommandOutcome::Selected(*selection)),
        }
    }
}
