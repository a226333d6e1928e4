//! The editing session: one scene, its history, and the tools acting on it.
//!
//! Every scene mutation goes through [`Editor::execute`], which applies the
//! command's [`HistoryPolicy`]. A free-hand stroke opens a gesture on
//! pointer-down and closes it on pointer-up, so the whole stroke is a single
//! history entry no matter how many points it collected.

use log::{debug, info, warn};
use uuid::Uuid;

use crate::background::{BackgroundLoader, LoadRequest, LoadResult};
use crate::command::{Command, CommandOutcome, History, HistoryEntry, HistoryPolicy};
use crate::config::EditorConfig;
use crate::element::{BackgroundImage, BackgroundSource, ObjectKind, SceneObject};
use crate::error::{EditorError, EditorResult};
use crate::export::{ExportFormat, ExportService, ExportedImage};
use crate::id_generator::ObjectId;
use crate::input::{InputEvent, KeyCommand};
use crate::persistence::{PersistenceResult, SceneDocument};
use crate::scene::Scene;
use crate::tools::{ToolKind, ToolSet, ToolState};

pub struct Editor {
    config: EditorConfig,
    scene: Scene,
    history: History,
    tools: ToolSet,
    /// Tool that received the last input; owns any gesture in progress
    active_tool: ToolKind,
    selection: Option<ObjectId>,
    /// Entry of the open gesture, committed when the gesture closes
    gesture: Option<HistoryEntry>,
    exporter: ExportService,
    loader: BackgroundLoader,
    document_id: Uuid,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        info!(
            "New editing session, canvas {}x{}",
            config.canvas_width, config.canvas_height
        );
        Self {
            scene: Scene::new(config.canvas_size(), config.background_color),
            history: History::with_limit(config.history_limit),
            tools: ToolSet::new(&config),
            active_tool: ToolKind::default(),
            selection: None,
            gesture: None,
            exporter: ExportService::new(),
            loader: BackgroundLoader::new(),
            document_id: Uuid::new_v4(),
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    pub fn selected_object(&self) -> Option<&SceneObject> {
        self.selection.and_then(|id| self.scene.get(id))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// True while a pointer gesture has not been released yet
    pub fn is_gesture_active(&self) -> bool {
        self.tools.get(self.active_tool).is_busy()
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    /// Feed one pointer event. Positions are clamped to the canvas first.
    pub fn handle_input(&mut self, state: &ToolState, event: InputEvent) -> EditorResult<()> {
        self.activate_tool(state.tool);
        let pos = self.scene.canvas_size().clamp(event.pos());
        let tool = self.tools.get_mut(state.tool);
        let command = match event {
            InputEvent::PointerDown { .. } => tool.on_pointer_down(pos, &self.scene, state),
            InputEvent::PointerMove { .. } => tool.on_pointer_move(pos, &self.scene, state),
            InputEvent::PointerUp { .. } => tool.on_pointer_up(pos, &self.scene, state),
        };
        if let Some(command) = command {
            self.execute(command)?;
        }
        Ok(())
    }

    /// Apply a keyboard action.
    pub fn handle_key(&mut self, key: KeyCommand) -> EditorResult<()> {
        match key {
            KeyCommand::DeleteSelected => self.delete_selected().map(|_| ()),
            KeyCommand::Undo => self.undo(),
            KeyCommand::Redo => self.redo(),
        }
    }

    /// Run a command against the scene and record history according to its policy.
    ///
    /// On error neither the scene nor the history changes.
    pub fn execute(&mut self, command: Command) -> EditorResult<CommandOutcome> {
        let policy = command.history_policy();
        let outcome = match policy {
            HistoryPolicy::Untracked | HistoryPolicy::WithinGesture => command.execute(&mut self.scene)?,
            HistoryPolicy::Commit => {
                self.close_pending_gesture();
                let before = self.scene.snapshot();
                let outcome = command.execute(&mut self.scene)?;
                if outcome != CommandOutcome::Unchanged {
                    self.history.commit(HistoryEntry::new(command.label(), before));
                }
                outcome
            }
            HistoryPolicy::OpenGesture => {
                self.close_pending_gesture();
                let before = self.scene.snapshot();
                let outcome = command.execute(&mut self.scene)?;
                self.gesture = Some(HistoryEntry::new(command.label(), before));
                outcome
            }
            HistoryPolicy::CloseGesture => {
                let outcome = command.execute(&mut self.scene)?;
                if let Some(entry) = self.gesture.take() {
                    self.history.commit(entry);
                }
                outcome
            }
        };

        match outcome {
            CommandOutcome::Selected(selection) => self.selection = selection,
            CommandOutcome::Removed(id) if self.selection == Some(id) => self.selection = None,
            CommandOutcome::Changed if self.scene.is_empty() => self.selection = None,
            _ => {}
        }
        Ok(outcome)
    }

    /// Place a default-sized shape at the configured anchor, as a toolbar
    /// button does. Returns `None` for tools that do not place shapes.
    pub fn place_default_shape(&mut self, state: &ToolState, kind: ToolKind) -> EditorResult<Option<ObjectId>> {
        let Some(object) = self.tools.default_shape(kind, self.config.placement_anchor, state.color) else {
            return Ok(None);
        };
        self.add_object(object)
    }

    /// Add a fully built object on top of the scene as one undoable step.
    pub fn add_object(&mut self, kind: ObjectKind) -> EditorResult<Option<ObjectId>> {
        self.finish_gesture();
        Ok(self.execute(Command::AddObject(kind))?.created())
    }

    pub fn delete_object(&mut self, id: ObjectId) -> EditorResult<()> {
        self.finish_gesture();
        self.execute(Command::RemoveObject(id)).map(|_| ())
    }

    /// Delete the selected object; returns what was deleted.
    pub fn delete_selected(&mut self) -> EditorResult<Option<ObjectId>> {
        let Some(id) = self.selection else {
            debug!("Delete with nothing selected");
            return Ok(None);
        };
        self.delete_object(id)?;
        Ok(Some(id))
    }

    /// Remove everything and restore the configured background color.
    /// Clearing an already clear scene records no history entry.
    pub fn clear(&mut self) -> EditorResult<()> {
        self.finish_gesture();
        let background_color = self.config.background_color;
        if self.execute(Command::Clear { background_color })? == CommandOutcome::Changed {
            info!("Canvas cleared");
        }
        Ok(())
    }

    pub fn undo(&mut self) -> EditorResult<()> {
        self.finish_gesture();
        let snapshot = self.history.undo(self.scene.snapshot())?;
        self.scene.restore(snapshot);
        self.revalidate_selection();
        Ok(())
    }

    pub fn redo(&mut self) -> EditorResult<()> {
        self.finish_gesture();
        let snapshot = self.history.redo(self.scene.snapshot())?;
        self.scene.restore(snapshot);
        self.revalidate_selection();
        Ok(())
    }

    /// Render-only preview of the gesture in progress.
    pub fn preview(&self, state: &ToolState) -> Option<ObjectKind> {
        self.tools.get(self.active_tool).preview(state)
    }

    /// Put an already decoded image into the background slot, scaled to fit the canvas.
    pub fn set_background(&mut self, image: BackgroundImage) -> EditorResult<ObjectId> {
        self.finish_gesture();
        let image = image.fitted_to(self.scene.canvas_size().to_vec2());
        self.execute(Command::SetBackground(image))?
            .created()
            .ok_or_else(|| EditorError::BackgroundLoadFailed("background was not placed".into()))
    }

    /// Start loading `source`; earlier requests still in flight become stale.
    pub fn request_background(&mut self, source: BackgroundSource) -> LoadRequest {
        self.loader.request(source)
    }

    /// Apply a finished background load. Stale results are ignored (`Ok(None)`).
    pub fn complete_background(&mut self, result: LoadResult) -> EditorResult<Option<ObjectId>> {
        match self.loader.complete(result)? {
            Some(image) => self.set_background(image).map(Some),
            None => Ok(None),
        }
    }

    pub fn is_background_loading(&self) -> bool {
        self.loader.is_pending()
    }

    pub fn export(&mut self, format: ExportFormat) -> EditorResult<ExportedImage> {
        self.exporter.export_raster(&self.scene, format)
    }

    pub fn export_in_background(
        &mut self,
        format: ExportFormat,
    ) -> futures::channel::oneshot::Receiver<EditorResult<ExportedImage>> {
        self.exporter.export_in_background(&self.scene, format)
    }

    pub fn to_document(&self) -> SceneDocument {
        SceneDocument::from_scene(self.document_id, &self.scene)
    }

    /// Replace the session with a stored document. History starts empty.
    pub fn load_document(&mut self, document: SceneDocument) -> PersistenceResult<()> {
        let id = document.id;
        let scene = document.into_scene()?;
        info!("Opened project {} with {} objects", id, scene.len());
        self.scene = scene;
        self.document_id = id;
        self.history.clear();
        self.tools = ToolSet::new(&self.config);
        self.gesture = None;
        self.selection = None;
        Ok(())
    }

    /// Make `kind` the tool receiving input. The previous tool's gesture is
    /// ended: a stroke is kept, a shape drag is dropped.
    pub fn activate_tool(&mut self, kind: ToolKind) {
        if kind == self.active_tool {
            return;
        }
        debug!("Switching tool {} -> {}", self.active_tool, kind);
        self.finish_gesture();
        self.active_tool = kind;
    }

    /// End whatever gesture the active tool has in progress.
    fn finish_gesture(&mut self) {
        if let Some(command) = self.tools.get_mut(self.active_tool).deactivate(&self.scene) {
            if let Err(err) = self.execute(command) {
                warn!("Could not finish gesture: {}", err);
            }
        }
        self.close_pending_gesture();
    }

    fn close_pending_gesture(&mut self) {
        if let Some(id) = self.scene.active_stroke() {
            if let Err(err) = self.scene.finish_stroke(id) {
                warn!("Could not finish stroke {}: {}", id, err);
            }
        }
        if let Some(entry) = self.gesture.take() {
            self.history.commit(entry);
        }
    }

    fn revalidate_selection(&mut self) {
        if let Some(id) = self.selection {
            if !self.scene.contains(id) {
                debug!("Selection {} no longer exists", id);
                self.selection = None;
            }
        }
    }
}
