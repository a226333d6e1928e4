//! Rasterization of a scene into pixels.
//!
//! Rendering is a pure function of the scene: the same scene always yields
//! the same pixmap. [`Renderer`] adds a one-frame cache keyed by the scene
//! revision so the canvas is only re-rasterized after a mutation. Tool
//! previews are drawn on a copy of the cached frame and never stored.

use egui::{Color32, ColorImage};
use image::RgbaImage;
use log::{debug, warn};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Transform,
};

use crate::element::{BackgroundImage, Ellipse, ObjectKind, Rectangle, Stroke};
use crate::scene::Scene;

fn skia_color(color: Color32) -> tiny_skia::Color {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

fn solid_paint(color: Color32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

/// Rasterize the whole scene at canvas resolution.
///
/// Returns `None` only when the canvas is too large to allocate.
pub fn render_scene(scene: &Scene) -> Option<Pixmap> {
    let size = scene.canvas_size();
    let mut pixmap = Pixmap::new(size.width, size.height)?;
    pixmap.fill(skia_color(scene.background_color()));
    for object in scene.list_objects() {
        draw_object(&mut pixmap, object.kind());
    }
    Some(pixmap)
}

/// Draw one object on top of whatever the pixmap already holds.
pub fn draw_object(pixmap: &mut Pixmap, kind: &ObjectKind) {
    match kind {
        ObjectKind::Stroke(stroke) => draw_stroke(pixmap, stroke),
        ObjectKind::Rectangle(rect) => draw_rectangle(pixmap, rect),
        ObjectKind::Ellipse(ellipse) => draw_ellipse(pixmap, ellipse),
        ObjectKind::BackgroundImage(image) => draw_background(pixmap, image),
    }
}

fn draw_dot(pixmap: &mut Pixmap, center: egui::Pos2, radius: f32, color: Color32) {
    if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
        pixmap.fill_path(&path, &solid_paint(color), FillRule::Winding, Transform::identity(), None);
    }
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &Stroke) {
    let points = stroke.points();
    let Some(&first) = points.first() else {
        return;
    };
    // A tap, or a drag that never left its starting point, still leaves a mark
    if stroke.is_dot() || points.iter().all(|p| *p == first) {
        draw_dot(pixmap, first, stroke.width() / 2.0, stroke.color());
        return;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in &points[1..] {
        pb.line_to(p.x, p.y);
    }
    let Some(path) = pb.finish() else {
        return;
    };
    let style = tiny_skia::Stroke {
        width: stroke.width(),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..tiny_skia::Stroke::default()
    };
    pixmap.stroke_path(&path, &solid_paint(stroke.color()), &style, Transform::identity(), None);
}

fn draw_rectangle(pixmap: &mut Pixmap, rect: &Rectangle) {
    let pos = rect.position();
    if let Some(r) = tiny_skia::Rect::from_xywh(pos.x, pos.y, rect.width(), rect.height()) {
        pixmap.fill_rect(r, &solid_paint(rect.fill()), Transform::identity(), None);
    }
}

fn draw_ellipse(pixmap: &mut Pixmap, ellipse: &Ellipse) {
    let (rx, ry) = (ellipse.radius_x(), ellipse.radius_y());
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }
    let c = ellipse.center();
    let Some(bounds) = tiny_skia::Rect::from_xywh(c.x - rx, c.y - ry, rx * 2.0, ry * 2.0) else {
        return;
    };
    if let Some(path) = PathBuilder::from_oval(bounds) {
        pixmap.fill_path(&path, &solid_paint(ellipse.fill()), FillRule::Winding, Transform::identity(), None);
    }
}

fn draw_background(pixmap: &mut Pixmap, image: &BackgroundImage) {
    let Some(raster) = image.raster() else {
        debug!("Background {} has no pixels yet, skipped", image.source().label());
        return;
    };
    let Some(source) = rgba_to_pixmap(raster) else {
        warn!("Background {} could not be converted for drawing", image.source().label());
        return;
    };
    let pos = image.position();
    let scale = image.scale();
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &paint,
        Transform::from_row(scale, 0.0, 0.0, scale, pos.x, pos.y),
        None,
    );
}

/// Copy straight-alpha RGBA pixels into a premultiplied pixmap.
pub fn rgba_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Straight-alpha copy of a rendered pixmap, ready for encoding.
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> Option<RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
}

/// egui texture data for a rendered pixmap.
pub fn to_color_image(pixmap: &Pixmap) -> ColorImage {
    ColorImage::from_rgba_premultiplied([pixmap.width() as usize, pixmap.height() as usize], pixmap.data())
}

#[derive(Debug)]
struct CachedFrame {
    revision: u64,
    pixmap: Pixmap,
}

/// Keeps the last rendered frame until the scene changes.
#[derive(Debug, Default)]
pub struct Renderer {
    cache: Option<CachedFrame>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the cached frame no longer matches `scene`.
    pub fn is_stale(&self, scene: &Scene) -> bool {
        self.cache.as_ref().is_none_or(|c| c.revision != scene.revision())
    }

    /// Rendered scene, re-rasterized only if the scene changed since the last call.
    pub fn frame(&mut self, scene: &Scene) -> Option<&Pixmap> {
        if self.is_stale(scene) {
            debug!("Re-rendering scene at revision {}", scene.revision());
            self.cache = render_scene(scene).map(|pixmap| CachedFrame {
                revision: scene.revision(),
                pixmap,
            });
        }
        self.cache.as_ref().map(|c| &c.pixmap)
    }

    /// Rendered scene with a transient preview drawn on top.
    pub fn render_with_preview(&mut self, scene: &Scene, preview: Option<&ObjectKind>) -> Option<Pixmap> {
        let mut pixmap = self.frame(scene)?.clone();
        if let Some(kind) = preview {
            draw_object(&mut pixmap, kind);
        }
        Some(pixmap)
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::factory;
    use crate::scene::CanvasSize;
    use egui::Pos2;

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = pixmap.pixel(x, y).unwrap().demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    fn scene() -> Scene {
        Scene::new(CanvasSize::new(200, 150), Color32::WHITE)
    }

    #[test]
    fn empty_scene_is_background_color() {
        let pixmap = render_scene(&scene()).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (200, 150));
        assert_eq!(pixel(&pixmap, 0, 0), [255, 255, 255, 255]);
        assert_eq!(pixel(&pixmap, 199, 149), [255, 255, 255, 255]);
    }

    #[test]
    fn later_objects_paint_over_earlier_ones() {
        let mut scene = scene();
        scene.add_object(factory::create_rectangle(Pos2::new(10.0, 10.0), 50.0, 50.0, Color32::RED));
        scene.add_object(factory::create_rectangle(Pos2::new(30.0, 30.0), 50.0, 50.0, Color32::BLUE));
        let pixmap = render_scene(&scene).unwrap();
        assert_eq!(pixel(&pixmap, 20, 20), [255, 0, 0, 255]);
        assert_eq!(pixel(&pixmap, 40, 40), [0, 0, 255, 255]);
        assert_eq!(pixel(&pixmap, 100, 100), [255, 255, 255, 255]);
    }

    #[test]
    fn ellipse_fills_center_not_corner() {
        let mut scene = scene();
        scene.add_object(factory::create_ellipse(Pos2::new(100.0, 75.0), 40.0, 30.0, Color32::GREEN));
        let pixmap = render_scene(&scene).unwrap();
        assert_eq!(pixel(&pixmap, 100, 75), [0, 255, 0, 255]);
        assert_eq!(pixel(&pixmap, 62, 47), [255, 255, 255, 255]);
    }

    #[test]
    fn single_point_stroke_renders_a_dot() {
        let mut scene = scene();
        scene.add_object(factory::create_stroke(vec![Pos2::new(50.0, 50.0)], Color32::BLACK, 10.0));
        let pixmap = render_scene(&scene).unwrap();
        assert_eq!(pixel(&pixmap, 50, 50), [0, 0, 0, 255]);
        assert_eq!(pixel(&pixmap, 70, 50), [255, 255, 255, 255]);
    }

    #[test]
    fn polyline_stroke_covers_its_segments() {
        let mut scene = scene();
        scene.add_object(factory::create_stroke(
            vec![Pos2::new(10.0, 10.0), Pos2::new(110.0, 10.0), Pos2::new(110.0, 110.0)],
            Color32::BLACK,
            6.0,
        ));
        let pixmap = render_scene(&scene).unwrap();
        assert_eq!(pixel(&pixmap, 60, 10), [0, 0, 0, 255]);
        assert_eq!(pixel(&pixmap, 110, 60), [0, 0, 0, 255]);
        assert_eq!(pixel(&pixmap, 60, 60), [255, 255, 255, 255]);
    }

    #[test]
    fn background_raster_is_drawn_scaled() {
        let mut scene = scene();
        let raster = RgbaImage::from_pixel(10, 10, image::Rgba([255, 0, 0, 255]));
        let image = BackgroundImage::new(crate::element::BackgroundSource::Url("mem://red".into()), Some(raster.into()))
            .with_placement(Pos2::ZERO, 5.0);
        scene.set_background_image(image);
        let pixmap = render_scene(&scene).unwrap();
        let [r, g, b, a] = pixel(&pixmap, 25, 25);
        assert!(r > 250 && g < 5 && b < 5 && a == 255, "got {:?}", [r, g, b, a]);
        assert_eq!(pixel(&pixmap, 150, 120), [255, 255, 255, 255]);
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut scene = scene();
        scene.add_object(factory::create_stroke(
            vec![Pos2::new(5.0, 5.0), Pos2::new(90.0, 40.0)],
            Color32::from_rgb(0x3b, 0x82, 0xf6),
            2.0,
        ));
        scene.add_object(factory::create_ellipse(Pos2::new(80.0, 80.0), 20.0, 20.0, Color32::RED));
        assert_eq!(render_scene(&scene).unwrap().data(), render_scene(&scene).unwrap().data());
    }

    #[test]
    fn renderer_cache_follows_revision() {
        let mut renderer = Renderer::new();
        let mut scene = scene();
        assert!(renderer.is_stale(&scene));
        renderer.frame(&scene).unwrap();
        assert!(!renderer.is_stale(&scene));

        scene.add_object(factory::create_rectangle(Pos2::new(0.0, 0.0), 10.0, 10.0, Color32::RED));
        assert!(renderer.is_stale(&scene));
        assert_eq!(pixel(renderer.frame(&scene).unwrap(), 5, 5), [255, 0, 0, 255]);
    }

    #[test]
    fn preview_does_not_enter_the_cache() {
        let mut renderer = Renderer::new();
        let scene = scene();
        let preview = factory::create_rectangle(Pos2::new(0.0, 0.0), 10.0, 10.0, Color32::RED);
        let with_preview = renderer.render_with_preview(&scene, Some(&preview)).unwrap();
        assert_eq!(pixel(&with_preview, 5, 5), [255, 0, 0, 255]);
        assert_eq!(pixel(renderer.frame(&scene).unwrap(), 5, 5), [255, 255, 255, 255]);
    }

    #[test]
    fn pixmap_round_trips_to_rgba() {
        let pixmap = render_scene(&scene()).unwrap();
        let rgba = pixmap_to_rgba(&pixmap).unwrap();
        assert_eq!(rgba.dimensions(), (200, 150));
        assert_eq!(rgba.get_pixel(3, 3).0, [255, 255, 255, 255]);
    }
}
