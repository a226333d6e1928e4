use crate::StagingApp;
use crate::components::{SwatchButton, ToolButton};
use crate::export::ExportFormat;
use crate::palette::{ColorChoice, PALETTE};
use crate::tools::ToolKind;

pub fn tools_panel(app: &mut StagingApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Tools");
            ui.horizontal(|ui| {
                for tool in ToolKind::ALL {
                    let selected = app.tool_state.tool == tool;
                    if ToolButton::new(tool, selected).show(ui).clicked() {
                        log::info!("Tool selected from UI: {}", tool);
                        app.select_tool(tool);
                    }
                }
            });

            ui.horizontal(|ui| {
                if ui.button("Add Rectangle").clicked() {
                    app.place_default_shape(ToolKind::PlaceRectangle);
                }
                if ui.button("Add Circle").clicked() {
                    app.place_default_shape(ToolKind::PlaceEllipse);
                }
            });
            ui.separator();

            ui.label("Color");
            ui.horizontal_wrapped(|ui| {
                for swatch in PALETTE {
                    let chip = SwatchButton {
                        color: swatch.color,
                        name: swatch.name,
                        selected: app.tool_state.color == swatch.color,
                    };
                    if chip.show(ui).clicked() {
                        let result = app.tool_state.set_color(&ColorChoice::Named(swatch.name.to_owned()));
                        app.report(result);
                    }
                }
            });
            ui.horizontal(|ui| {
                ui.label("Custom");
                let mut color = app.tool_state.color;
                if ui.color_edit_button_srgba(&mut color).changed() {
                    let result = app.tool_state.set_color(&ColorChoice::Rgb(color));
                    app.report(result);
                }
            });

            let mut width = app.tool_state.stroke_width;
            if ui
                .add(egui::Slider::new(&mut width, 1.0..=50.0).text("Brush size"))
                .changed()
            {
                app.tool_state.set_stroke_width(width);
            }
            ui.separator();

            ui.horizontal(|ui| {
                if ui.add_enabled(app.editor.can_undo(), egui::Button::new("Undo")).clicked() {
                    app.undo();
                }
                if ui.add_enabled(app.editor.can_redo(), egui::Button::new("Redo")).clicked() {
                    app.redo();
                }
                if ui.button("Clear").clicked() {
                    app.clear();
                }
            });
            if ui
                .add_enabled(app.editor.selection().is_some(), egui::Button::new("Delete selected"))
                .clicked()
            {
                let result = app.editor.delete_selected();
                app.report(result);
            }
            ui.separator();

            ui.heading("Room photos");
            if app.catalog.is_empty() {
                ui.weak("Drop an image file onto the window");
            }
            let mut chosen = None;
            for source in app.catalog.iter() {
                if ui.button(source.label()).clicked() {
                    chosen = Some(source.clone());
                }
            }
            if let Some(source) = chosen {
                app.load_background(source);
            }
            if app.editor.is_background_loading() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading background…");
                });
            }
            ui.separator();

            ui.heading("Export");
            ui.horizontal(|ui| {
                if ui.button("Export PNG").clicked() {
                    app.export(ExportFormat::Png);
                }
                if ui.button("Export JPEG").clicked() {
                    let quality = app.jpeg_quality;
                    app.export(ExportFormat::Jpeg { quality });
                }
            });
            ui.add(egui::Slider::new(&mut app.jpeg_quality, 1..=100).text("JPEG quality"));
            ui.horizontal(|ui| {
                if ui.button("Save Project").clicked() {
                    app.save_project();
                }
                if ui
                    .add_enabled(app.last_project.is_some(), egui::Button::new("Open last"))
                    .clicked()
                {
                    app.open_last_project();
                }
            });
            ui.separator();

            let history = app.editor.history();
            ui.horizontal(|ui| {
                ui.label(format!("Undo stack size: {}", history.undo_len()));
                ui.label(format!("Redo stack size: {}", history.redo_len()));
            });

            egui::Grid::new("history_grid")
                .num_columns(2)
                .spacing([40.0, 4.0])
                .striped(true)
                .show(ui, |ui| {
                    ui.strong("Undo Stack");
                    ui.strong("Redo Stack");
                    ui.end_row();

                    let undo: Vec<_> = history.undo_entries().rev().map(|e| e.label()).collect();
                    let redo: Vec<_> = history.redo_entries().rev().map(|e| e.label()).collect();
                    for i in 0..undo.len().max(redo.len()) {
                        ui.label(undo.get(i).copied().unwrap_or(""));
                        ui.label(redo.get(i).copied().unwrap_or(""));
                        ui.end_row();
                    }
                });
        });
}
