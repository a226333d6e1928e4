use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::Element;
use crate::element::common::non_negative;

/// Axis-aligned filled rectangle, positioned by its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRectangle")]
pub struct Rectangle {
    position: Pos2,
    width: f32,
    height: f32,
    fill: Color32,
}

// Loaded sizes go through the constructors so they are clamped like user input
#[derive(Deserialize)]
struct StoredRectangle {
    position: Pos2,
    width: f32,
    height: f32,
    fill: Color32,
}

impl From<StoredRectangle> for Rectangle {
    fn from(stored: StoredRectangle) -> Self {
        Rectangle::new(stored.position, stored.width, stored.height, stored.fill)
    }
}

impl Rectangle {
    pub fn new(position: Pos2, width: f32, height: f32, fill: Color32) -> Self {
        Self {
            position,
            width: non_negative(width),
            height: non_negative(height),
            fill,
        }
    }

    /// Rectangle spanning two arbitrary corners, as produced by a drag.
    pub fn from_corners(a: Pos2, b: Pos2, fill: Color32) -> Self {
        let rect = Rect::from_two_pos(a, b);
        Self::new(rect.min, rect.width(), rect.height(), fill)
    }

    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn fill(&self) -> Color32 {
        self.fill
    }
}

impl Element for Rectangle {
    fn element_type(&self) -> &'static str {
        "rectangle"
    }

    fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, Vec2::new(self.width, self.height))
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        self.rect().contains(pos)
    }
}

/// Axis-aligned filled ellipse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredEllipse")]
pub struct Ellipse {
    center: Pos2,
    radius_x: f32,
    radius_y: f32,
    fill: Color32,
}

#[derive(Deserialize)]
struct StoredEllipse {
    center: Pos2,
    radius_x: f32,
    radius_y: f32,
    fill: Color32,
}

impl From<StoredEllipse> for Ellipse {
    fn from(stored: StoredEllipse) -> Self {
        Ellipse::new(stored.center, stored.radius_x, stored.radius_y, stored.fill)
    }
}

impl Ellipse {
    pub fn new(center: Pos2, radius_x: f32, radius_y: f32, fill: Color32) -> Self {
        Self {
            center,
            radius_x: non_negative(radius_x),
            radius_y: non_negative(radius_y),
            fill,
        }
    }

    /// Ellipse inscribed in the box spanned by two corners.
    pub fn inscribed(a: Pos2, b: Pos2, fill: Color32) -> Self {
        let rect = Rect::from_two_pos(a, b);
        Self::new(rect.center(), rect.width() / 2.0, rect.height() / 2.0, fill)
    }

    pub fn center(&self) -> Pos2 {
        self.center
    }

    pub fn radius_x(&self) -> f32 {
        self.radius_x
    }

    pub fn radius_y(&self) -> f32 {
        self.radius_y
    }

    pub fn fill(&self) -> Color32 {
        self.fill
    }
}

impl Element for Ellipse {
    fn element_type(&self) -> &'static str {
        "ellipse"
    }

    fn rect(&self) -> Rect {
        Rect::from_center_size(self.center, Vec2::new(self.radius_x * 2.0, self.radius_y * 2.0))
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        if self.radius_x <= 0.0 || self.radius_y <= 0.0 {
            return false;
        }
        let dx = (pos.x - self.center.x) / self.radius_x;
        let dy = (pos.y - self.center.y) / self.radius_y;
        dx * dx + dy * dy <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loaded_sizes_are_clamped() {
        let mut value = serde_json::to_value(Rectangle::new(Pos2::ZERO, 10.0, 10.0, Color32::RED)).unwrap();
        value["width"] = serde_json::json!(-40.0);
        let rect: Rectangle = serde_json::from_value(value).unwrap();
        assert_eq!(rect.width(), 0.0);
        assert_eq!(rect.height(), 10.0);

        let mut value = serde_json::to_value(Ellipse::new(Pos2::ZERO, 5.0, 5.0, Color32::RED)).unwrap();
        value["radius_y"] = serde_json::json!(-1.0);
        let ellipse: Ellipse = serde_json::from_value(value).unwrap();
        assert_eq!(ellipse.radius_y(), 0.0);
    }

    #[test]
    fn rectangle_from_corners_normalizes() {
        let rect = Rectangle::from_corners(Pos2::new(50.0, 80.0), Pos2::new(10.0, 20.0), Color32::RED);
        assert_eq!(rect.position(), Pos2::new(10.0, 20.0));
        assert_eq!(rect.width(), 40.0);
        assert_eq!(rect.height(), 60.0);
    }

    #[test]
    fn negative_sizes_become_zero() {
        let rect = Rectangle::new(Pos2::ZERO, -5.0, 10.0, Color32::RED);
        assert_eq!(rect.width(), 0.0);
        let ellipse = Ellipse::new(Pos2::ZERO, 3.0, -1.0, Color32::RED);
        assert_eq!(ellipse.radius_y(), 0.0);
        assert!(!ellipse.hit_test(Pos2::ZERO));
    }

    #[test]
    fn ellipse_hit_test_excludes_bounding_box_corners() {
        let ellipse = Ellipse::new(Pos2::new(150.0, 150.0), 50.0, 50.0, Color32::BLUE);
        assert!(ellipse.hit_test(Pos2::new(150.0, 150.0)));
        assert!(ellipse.hit_test(Pos2::new(199.0, 150.0)));
        assert!(!ellipse.hit_test(Pos2::new(102.0, 102.0)));
        assert_eq!(ellipse.rect(), Rect::from_min_max(Pos2::new(100.0, 100.0), Pos2::new(200.0, 200.0)));
    }
}
