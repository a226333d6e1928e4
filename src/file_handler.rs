use eframe::egui;
use std::collections::HashSet;

use crate::element::BackgroundSource;

/// Turns files dropped onto the window into background sources.
#[derive(Debug, Default)]
pub struct FileHandler {
    processed_files: HashSet<String>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources for image files dropped this frame. A file is only reported once.
    pub fn take_dropped_sources(&mut self, ctx: &egui::Context) -> Vec<BackgroundSource> {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        dropped
            .iter()
            .filter_map(|file| {
                let file_name = Self::display_name(file);
                if self.processed_files.contains(&file_name) {
                    return None;
                }
                if !Self::is_image_file(file) {
                    log::warn!("Dropped file is not a supported type: {}", file_name);
                    return None;
                }
                let source = Self::source_for(file, &file_name)?;
                self.processed_files.insert(file_name);
                Some(source)
            })
            .collect()
    }

    fn display_name(file: &egui::DroppedFile) -> String {
        if let Some(path) = &file.path {
            path.display().to_string()
        } else if !file.name.is_empty() {
            file.name.clone()
        } else {
            "unknown".to_owned()
        }
    }

    /// Check if a file is an image based on MIME type or extension
    fn is_image_file(file: &egui::DroppedFile) -> bool {
        if !file.mime.is_empty() {
            return file.mime.starts_with("image/");
        }
        let name = file
            .path
            .as_ref()
            .and_then(|p| p.extension())
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .or_else(|| file.name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()));
        matches!(name.as_deref(), Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp"))
    }

    fn source_for(file: &egui::DroppedFile, file_name: &str) -> Option<BackgroundSource> {
        if let Some(bytes) = &file.bytes {
            log::info!("Dropped image in memory: {} ({} bytes)", file_name, bytes.len());
            return Some(BackgroundSource::Embedded {
                name: file_name.to_owned(),
                bytes: bytes.to_vec(),
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(path) = &file.path {
                log::info!("Dropped image on disk: {}", path.display());
                return Some(BackgroundSource::Url(format!("file://{}", path.display())));
            }
        }

        log::warn!("Dropped file has no accessible data: {}", file_name);
        None
    }

    /// Preview files being dragged over the application
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, Id, LayerId, Order};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }
        let text = ctx.input(|i| {
            let mut text = "Drop to use as room background:\n".to_owned();
            for file in &i.raw.hovered_files {
                if let Some(path) = &file.path {
                    text += &format!("\n{}", path.display());
                } else {
                    text += "\n(Path not available)";
                }
            }
            text
        });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            egui::TextStyle::Heading.resolve(&ctx.style()),
            Color32::WHITE,
        );
    }
}
