use crate::StagingApp;
use crate::element::Element;
use crate::input::InputHandler;
use crate::renderer::to_color_image;

const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(33, 150, 243);

pub fn central_panel(app: &mut StagingApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let canvas_size = app.editor.scene().canvas_size();
        let available = ui.available_rect_before_wrap();
        let scale = (available.width() / canvas_size.width as f32)
            .min(available.height() / canvas_size.height as f32)
            .min(1.0)
            .max(0.1);
        let canvas_rect = egui::Rect::from_center_size(available.center(), canvas_size.to_vec2() * scale);
        ui.allocate_rect(canvas_rect, egui::Sense::click_and_drag());

        // Input first so this frame shows its effect
        for event in app.input.process_input(ctx, canvas_rect, canvas_size) {
            let result = app.editor.handle_input(&app.tool_state, event);
            app.report(result);
        }

        update_texture(app, ctx);

        let painter = ui.painter_at(canvas_rect);
        if let Some(texture) = &app.texture {
            painter.image(
                texture.id(),
                canvas_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        if let Some(object) = app.editor.selected_object() {
            let bounds = object.rect();
            let to_screen = |p: egui::Pos2| canvas_rect.min + p.to_vec2() * scale;
            let outline = egui::Rect::from_min_max(to_screen(bounds.min), to_screen(bounds.max)).expand(2.0);
            painter.rect_stroke(outline, 2.0, egui::Stroke::new(1.5, SELECTION_COLOR));
        }

        if app.input.is_pressed() {
            ctx.request_repaint();
        }
        if let Some(hover) = ctx.pointer_hover_pos().filter(|p| canvas_rect.contains(*p)) {
            let pos = InputHandler::to_canvas(hover, canvas_rect, canvas_size);
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
            ui.put(
                egui::Rect::from_min_size(canvas_rect.left_bottom() + egui::vec2(0.0, 4.0), egui::vec2(160.0, 16.0)),
                egui::Label::new(egui::RichText::new(format!("{:.0}, {:.0}", pos.x, pos.y)).weak()),
            );
        }
    });
}

/// Upload a new canvas texture when the scene changed or a preview is showing.
fn update_texture(app: &mut StagingApp, ctx: &egui::Context) {
    let preview = app.editor.preview(&app.tool_state);
    let scene = app.editor.scene();
    let needs_upload = app.texture.is_none()
        || app.renderer.is_stale(scene)
        || preview.is_some()
        || app.showing_preview;
    if !needs_upload {
        return;
    }
    let Some(pixmap) = app.renderer.render_with_preview(scene, preview.as_ref()) else {
        log::error!("Canvas could not be rendered");
        return;
    };
    let image = to_color_image(&pixmap);
    match &mut app.texture {
        Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
        None => app.texture = Some(ctx.load_texture("canvas", image, egui::TextureOptions::LINEAR)),
    }
    app.showing_preview = preview.is_some();
}
