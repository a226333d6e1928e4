use egui::{Color32, Pos2, Rect};
use serde::{Deserialize, Serialize};

use super::Element;
use crate::element::common;

/// Free-hand stroke: a polyline drawn with a round pen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredStroke")]
pub struct Stroke {
    points: Vec<Pos2>,
    color: Color32,
    width: f32,
}

#[derive(Deserialize)]
struct StoredStroke {
    points: Vec<Pos2>,
    color: Color32,
    width: f32,
}

impl From<StoredStroke> for Stroke {
    fn from(stored: StoredStroke) -> Self {
        Stroke::new(stored.points, stored.color, stored.width)
    }
}

impl Stroke {
    /// Create a new stroke; widths below one pixel are raised to one.
    pub fn new(points: Vec<Pos2>, color: Color32, width: f32) -> Self {
        Self {
            points,
            color,
            width: clamp_width(width),
        }
    }

    /// A stroke that so far only consists of the pointer-down position.
    pub fn starting_at(point: Pos2, color: Color32, width: f32) -> Self {
        Self::new(vec![point], color, width)
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// A stroke with a single point is a tap, drawn as a dot.
    pub fn is_dot(&self) -> bool {
        self.points.len() == 1
    }

    pub(crate) fn push_point(&mut self, point: Pos2) {
        self.points.push(point);
    }
}

fn clamp_width(width: f32) -> f32 {
    if width.is_nan() {
        common::MIN_STROKE_WIDTH
    } else {
        width.max(common::MIN_STROKE_WIDTH)
    }
}

impl Element for Stroke {
    fn element_type(&self) -> &'static str {
        "stroke"
    }

    fn rect(&self) -> Rect {
        common::calculate_bounds(&self.points, self.width / 2.0)
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        let reach = self.width / 2.0 + common::STROKE_HIT_SLOP;
        match self.points.as_slice() {
            [] => false,
            [only] => only.distance(pos) <= reach,
            points => points
                .windows(2)
                .any(|w| common::distance_to_line_segment(pos, w[0], w[1]) <= reach),
        }
    }
}
