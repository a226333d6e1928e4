use eframe::egui;

use crate::tools::ToolKind;

const SELECTED_FILL: egui::Color32 = egui::Color32::from_rgb(100, 181, 246);
const SELECTED_BORDER: egui::Color32 = egui::Color32::from_rgb(33, 150, 243);

/// Square toolbar button showing a glyph for one tool
pub struct ToolButton {
    pub tool: ToolKind,
    pub selected: bool,
}

impl ToolButton {
    pub fn new(tool: ToolKind, selected: bool) -> Self {
        Self { tool, selected }
    }

    fn icon(&self) -> &'static str {
        match self.tool {
            ToolKind::Select => "⬉",
            ToolKind::FreeDraw => "✏",
            ToolKind::PlaceRectangle => "⬛",
            ToolKind::PlaceEllipse => "⚫",
        }
    }

    pub fn show(&self, ui: &mut egui::Ui) -> egui::Response {
        let button_size = egui::vec2(32.0, 32.0);
        let (rect, response) = ui.allocate_exact_size(button_size, egui::Sense::click());

        if ui.is_rect_visible(rect) {
            let bg_color = if self.selected {
                SELECTED_FILL
            } else if response.hovered() {
                egui::Color32::from_gray(40)
            } else {
                egui::Color32::from_gray(30)
            };
            ui.painter().rect_filled(rect, 4.0, bg_color);

            let text_color = if self.selected {
                egui::Color32::BLACK
            } else {
                egui::Color32::WHITE
            };
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                self.icon(),
                egui::FontId::proportional(20.0),
                text_color,
            );

            if self.selected {
                ui.painter()
                    .rect_stroke(rect, 4.0, egui::Stroke::new(2.0, SELECTED_BORDER));
            }
        }

        response.on_hover_text(self.tool.label())
    }
}

/// Round color chip of the palette
pub struct SwatchButton {
    pub color: egui::Color32,
    pub name: &'static str,
    pub selected: bool,
}

impl SwatchButton {
    pub fn show(&self, ui: &mut egui::Ui) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(egui::vec2(24.0, 24.0), egui::Sense::click());
        if ui.is_rect_visible(rect) {
            let radius = rect.width() / 2.0 - 2.0;
            ui.painter().circle_filled(rect.center(), radius, self.color);
            if self.selected || response.hovered() {
                let width = if self.selected { 2.5 } else { 1.0 };
                ui.painter()
                    .circle_stroke(rect.center(), radius + 1.5, egui::Stroke::new(width, ui.visuals().text_color()));
            }
        }
        response.on_hover_text(self.name)
    }
}
