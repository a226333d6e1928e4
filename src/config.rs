use egui::{Color32, Pos2, Vec2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::scene::CanvasSize;

/// Errors that can occur while reading an editor configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Editor defaults. Missing fields in a config file fall back to these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    #[serde(with = "hex_color")]
    pub background_color: Color32,
    #[serde(with = "hex_color")]
    pub default_color: Color32,
    pub default_stroke_width: f32,
    pub default_rectangle_size: Vec2,
    pub default_ellipse_radius: f32,
    /// Where one-shot placements (toolbar invocation) put new shapes
    pub placement_anchor: Pos2,
    /// Pointer travel below which a press/release counts as a click
    pub drag_threshold: f32,
    /// Maximum undo depth; `None` keeps the whole session
    pub history_limit: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 600,
            background_color: Color32::WHITE,
            default_color: Color32::from_rgb(0x3b, 0x82, 0xf6),
            default_stroke_width: 2.0,
            default_rectangle_size: Vec2::new(100.0, 100.0),
            default_ellipse_radius: 50.0,
            placement_anchor: Pos2::new(100.0, 100.0),
            drag_threshold: 3.0,
            history_limit: None,
        }
    }
}

impl EditorConfig {
    pub fn canvas_size(&self) -> CanvasSize {
        CanvasSize::new(self.canvas_width, self.canvas_height)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load `path` if it exists, otherwise use the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded editor config from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("Ignoring config {}: {}", path.display(), err);
                Self::default()
            }
        }
    }
}

/// `#rrggbb` (or `#rrggbbaa`) representation of colors in config files
pub(crate) mod hex_color {
    use egui::Color32;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        let hex = if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        };
        serializer.serialize_str(&hex)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Color32::from_hex(&hex).map_err(|_| de::Error::custom(format!("invalid color {hex:?}")))
    }
}
