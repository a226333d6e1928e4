use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};

/// A named color of the fixed studio palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub name: &'static str,
    pub color: Color32,
}

/// The eight swatches offered next to the canvas, in display order.
pub const PALETTE: [Swatch; 8] = [
    Swatch { name: "blue", color: Color32::from_rgb(0x3b, 0x82, 0xf6) },
    Swatch { name: "red", color: Color32::from_rgb(0xef, 0x44, 0x44) },
    Swatch { name: "green", color: Color32::from_rgb(0x10, 0xb9, 0x81) },
    Swatch { name: "amber", color: Color32::from_rgb(0xf5, 0x9e, 0x0b) },
    Swatch { name: "violet", color: Color32::from_rgb(0x8b, 0x5c, 0xf6) },
    Swatch { name: "cyan", color: Color32::from_rgb(0x06, 0xb6, 0xd4) },
    Swatch { name: "lime", color: Color32::from_rgb(0x84, 0xcc, 0x16) },
    Swatch { name: "orange", color: Color32::from_rgb(0xf9, 0x73, 0x16) },
];

/// How the user picked a drawing color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorChoice {
    Rgb(Color32),
    Named(String),
}

impl ColorChoice {
    pub fn resolve(&self) -> EditorResult<Color32> {
        match self {
            ColorChoice::Rgb(color) => Ok(*color),
            ColorChoice::Named(name) => swatch(name)
                .map(|s| s.color)
                .ok_or_else(|| EditorError::UnknownSwatch(name.clone())),
        }
    }
}

/// Look up a swatch by name (case-insensitive) or by its `#rrggbb` value.
pub fn swatch(name: &str) -> Option<Swatch> {
    let name = name.trim();
    if name.starts_with('#') {
        let color = Color32::from_hex(name).ok()?;
        return PALETTE.iter().copied().find(|s| s.color == color);
    }
    PALETTE
        .iter()
        .copied()
        .find(|s| s.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_swatches_resolve() {
        let blue = ColorChoice::Named("Blue".into()).resolve().unwrap();
        assert_eq!(blue, Color32::from_rgb(59, 130, 246));
        assert_eq!(swatch("#ef4444").map(|s| s.name), Some("red"));
    }

    #[test]
    fn unknown_swatch_is_an_error() {
        let err = ColorChoice::Named("mauve".into()).resolve().unwrap_err();
        assert_eq!(err, EditorError::UnknownSwatch("mauve".into()));
    }

    #[test]
    fn rgb_choice_passes_through() {
        let c = Color32::from_rgb(1, 2, 3);
        assert_eq!(ColorChoice::Rgb(c).resolve().unwrap(), c);
    }
}
