use futures::channel::oneshot;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

use crate::background::{BackgroundLoader, ImageCatalog, ImageFetcher, LoadInbox, LocalFetcher};
use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::element::BackgroundSource;
use crate::error::EditorResult;
use crate::export::{ExportFormat, ExportedImage};
use crate::file_handler::FileHandler;
use crate::input::InputHandler;
use crate::panels::{central_panel, tools_panel};
use crate::persistence::ProjectStore;
use crate::renderer::Renderer;
use crate::tools::{ToolKind, ToolState};
use crate::util::time;

const NOTIFICATION_SECS: f64 = 4.0;

/// Transient message shown in the corner of the window
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub is_error: bool,
    created_at: f64,
}

/// We derive Deserialize/Serialize so we can persist app state on shutdown.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct StagingApp {
    pub(crate) tool_state: ToolState,
    pub(crate) jpeg_quality: u8,
    pub(crate) project_dir: PathBuf,
    pub(crate) last_project: Option<String>,

    #[serde(skip)]
    pub(crate) editor: Editor,
    #[serde(skip)]
    pub(crate) renderer: Renderer,
    #[serde(skip)]
    pub(crate) input: InputHandler,
    #[serde(skip)]
    pub(crate) files: FileHandler,
    #[serde(skip)]
    pub(crate) catalog: ImageCatalog,
    #[serde(skip)]
    fetcher: Arc<dyn ImageFetcher>,
    #[serde(skip)]
    inbox: LoadInbox,
    #[serde(skip)]
    pending_exports: Vec<oneshot::Receiver<EditorResult<ExportedImage>>>,
    #[serde(skip)]
    pub(crate) notifications: Vec<Notification>,
    #[serde(skip)]
    pub(crate) texture: Option<egui::TextureHandle>,
    #[serde(skip)]
    pub(crate) showing_preview: bool,
}

impl Default for StagingApp {
    fn default() -> Self {
        Self::with_config(EditorConfig::default())
    }
}

impl StagingApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, config: EditorConfig) -> Self {
        let fresh = Self::with_config(config);
        let Some(stored) = cc
            .storage
            .and_then(|storage| eframe::get_value::<StagingApp>(storage, eframe::APP_KEY))
        else {
            return fresh;
        };
        log::info!("Restored tool settings from the previous session");
        Self {
            tool_state: stored.tool_state,
            jpeg_quality: stored.jpeg_quality,
            project_dir: stored.project_dir,
            last_project: stored.last_project,
            ..fresh
        }
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            tool_state: ToolState::from_config(&config),
            jpeg_quality: 90,
            project_dir: PathBuf::from("projects"),
            last_project: None,
            editor: Editor::new(config),
            renderer: Renderer::new(),
            input: InputHandler::new(),
            files: FileHandler::new(),
            catalog: ImageCatalog::new(),
            fetcher: Arc::new(LocalFetcher),
            inbox: Arc::new(Mutex::new(Vec::new())),
            pending_exports: Vec::new(),
            notifications: Vec::new(),
            texture: None,
            showing_preview: false,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.push_notification(message, false);
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.push_notification(message, true);
    }

    fn push_notification(&mut self, message: String, is_error: bool) {
        self.notifications.push(Notification {
            message,
            is_error,
            created_at: time::current_time_secs(),
        });
    }

    /// Report the error of a user action, if any
    pub(crate) fn report<T>(&mut self, result: EditorResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.notify_error(err.to_string());
                None
            }
        }
    }

    pub fn select_tool(&mut self, tool: ToolKind) {
        self.tool_state.select_tool(tool);
        self.editor.activate_tool(tool);
    }

    pub fn undo(&mut self) {
        let result = self.editor.undo();
        self.report(result);
    }

    pub fn redo(&mut self) {
        let result = self.editor.redo();
        self.report(result);
    }

    pub fn clear(&mut self) {
        let result = self.editor.clear();
        self.report(result);
    }

    pub fn place_default_shape(&mut self, kind: ToolKind) {
        let result = self.editor.place_default_shape(&self.tool_state, kind);
        self.report(result);
    }

    /// Queue a background load for a catalog entry
    pub fn load_background(&mut self, source: BackgroundSource) {
        let request = self.editor.request_background(source);
        BackgroundLoader::spawn_load(self.fetcher.clone(), request, self.inbox.clone());
    }

    pub fn export(&mut self, format: ExportFormat) {
        let receiver = self.editor.export_in_background(format);
        self.pending_exports.push(receiver);
    }

    pub fn save_project(&mut self) {
        let document = self.editor.to_document();
        let name = format!("project-{}", document.id);
        match ProjectStore::new(&self.project_dir).save(&document, &name) {
            Ok(path) => {
                self.last_project = Some(name);
                self.notify(format!("Project saved to {}", path.display()));
            }
            Err(err) => self.notify_error(format!("Saving project failed: {}", err)),
        }
    }

    pub fn open_last_project(&mut self) {
        let Some(name) = self.last_project.clone() else {
            self.notify_error("No saved project yet");
            return;
        };
        let loaded = ProjectStore::new(&self.project_dir)
            .load(&name)
            .and_then(|document| self.editor.load_document(document));
        match loaded {
            Ok(()) => self.notify(format!("Opened {}", name)),
            Err(err) => self.notify_error(format!("Opening project failed: {}", err)),
        }
    }

    fn poll_background_loads(&mut self) {
        let finished: Vec<_> = self.inbox.lock().drain(..).collect();
        for result in finished {
            let applied = self.editor.complete_background(result);
            if let Some(Some(_)) = self.report(applied) {
                self.notify("Background updated");
            }
        }
    }

    fn poll_exports(&mut self) {
        let mut still_pending = Vec::new();
        let mut finished = Vec::new();
        let mut canceled = 0;
        for mut receiver in self.pending_exports.drain(..) {
            match receiver.try_recv() {
                Ok(Some(result)) => finished.push(result),
                Ok(None) => still_pending.push(receiver),
                Err(oneshot::Canceled) => canceled += 1,
            }
        }
        self.pending_exports = still_pending;

        for _ in 0..canceled {
            self.notify_error("Export stopped before the image was encoded");
        }

        for result in finished {
            if let Some(exported) = self.report(result) {
                self.deliver_export(exported);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn deliver_export(&mut self, exported: ExportedImage) {
        match std::fs::write(&exported.filename, &exported.bytes) {
            Ok(()) => self.notify(format!("Saved {}", exported.filename)),
            Err(err) => self.notify_error(format!("Could not write {}: {}", exported.filename, err)),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn deliver_export(&mut self, exported: ExportedImage) {
        self.notify(format!("{} ready ({} bytes)", exported.filename, exported.bytes.len()));
    }

    fn take_dropped_files(&mut self, ctx: &egui::Context) {
        let sources = self.files.take_dropped_sources(ctx);
        if let Some(last) = sources.last().cloned() {
            for source in sources {
                self.catalog.add(source);
            }
            self.load_background(last);
        }
    }

    fn show_notifications(&mut self, ctx: &egui::Context) {
        let now = time::current_time_secs();
        self.notifications
            .retain(|n| now - n.created_at < NOTIFICATION_SECS);
        if self.notifications.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("notifications"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .show(ctx, |ui| {
                for notification in &self.notifications {
                    let color = if notification.is_error {
                        egui::Color32::from_rgb(0xef, 0x44, 0x44)
                    } else {
                        ui.visuals().text_color()
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.colored_label(color, &notification.message);
                    });
                }
            });
        ctx.request_repaint_after(std::time::Duration::from_millis(250));
    }
}

impl eframe::App for StagingApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background_loads();
        self.poll_exports();
        self.take_dropped_files(ctx);

        if !ctx.wants_keyboard_input() {
            for key in InputHandler::key_commands(ctx) {
                let result = self.editor.handle_key(key);
                self.report(result);
            }
        }

        tools_panel(self, ctx);
        central_panel(self, ctx);

        self.files.preview_files_being_dropped(ctx);
        self.show_notifications(ctx);

        if self.editor.is_background_loading() || !self.pending_exports.is_empty() {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abandoned_export_is_reported() {
        let mut app = StagingApp::default();
        let (sender, receiver) = oneshot::channel();
        drop(sender);
        app.pending_exports.push(receiver);

        app.poll_exports();
        assert!(app.pending_exports.is_empty());
        assert_eq!(app.notifications.len(), 1);
        assert!(app.notifications[0].is_error);
    }

    #[test]
    fn unfinished_export_stays_pending() {
        let mut app = StagingApp::default();
        let (_sender, receiver) = oneshot::channel();
        app.pending_exports.push(receiver);

        app.poll_exports();
        assert_eq!(app.pending_exports.len(), 1);
        assert!(app.notifications.is_empty());
    }
}
