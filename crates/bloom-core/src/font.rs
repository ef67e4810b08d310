//! Typeface fonts and text measurement
//!
//! Fonts are the JSON "typeface" documents served alongside three.js
//! (e.g. `helvetiker_regular.typeface.json`). Each glyph carries a
//! horizontal advance and an outline string made of `m`/`l`/`q`/`b`
//! commands in font units. Text is laid out by advancing glyph by glyph and
//! scaling font units by `size / resolution`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::FontError;

/// Glyph used in place of characters the font does not define
const MISSING_GLYPH: char = '?';

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct FontBoundingBox {
    #[serde(rename = "xMin", default)]
    pub x_min: f32,
    #[serde(rename = "xMax", default)]
    pub x_max: f32,
    #[serde(rename = "yMin", default)]
    pub y_min: f32,
    #[serde(rename = "yMax", default)]
    pub y_max: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Glyph {
    /// Horizontal advance in font units
    pub ha: f32,
    #[serde(default)]
    pub x_min: f32,
    #[serde(default)]
    pub x_max: f32,
    /// Outline commands, absent for whitespace glyphs
    #[serde(default)]
    pub o: Option<String>,
}

impl Glyph {
    /// On-curve outline points in font units
    pub fn outline_points(&self) -> Vec<(f32, f32)> {
        let Some(outline) = &self.o else {
            return Vec::new();
        };

        let tokens: Vec<&str> = outline.split_whitespace().collect();
        let num = |i: usize| tokens.get(i).and_then(|t| t.parse::<f32>().ok());
        let mut points = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            // Number of coordinates following the command; the first pair is the on-curve point
            let arity = match tokens[i] {
                "m" | "l" => 2,
                "q" => 4,
                "b" => 6,
                _ => {
                    i += 1;
                    continue;
                }
            };
            if let (Some(x), Some(y)) = (num(i + 1), num(i + 2)) {
                points.push((x, y));
            }
            i += 1 + arity;
        }

        points
    }
}

#[derive(Deserialize)]
struct RawTypeface {
    glyphs: HashMap<String, Glyph>,
    #[serde(rename = "familyName", default)]
    family_name: String,
    resolution: f32,
    #[serde(rename = "boundingBox", default)]
    bounding_box: FontBoundingBox,
    #[serde(rename = "underlineThickness", default)]
    underline_thickness: f32,
    #[serde(rename = "underlinePosition", default)]
    underline_position: f32,
}

/// A parsed typeface font
#[derive(Debug, Clone)]
pub struct TypefaceFont {
    pub family_name: String,
    pub resolution: f32,
    pub bounding_box: FontBoundingBox,
    pub underline_thickness: f32,
    pub underline_position: f32,
    glyphs: HashMap<char, Glyph>,
}

impl TypefaceFont {
    /// Parse a typeface JSON document
    pub fn from_json(content: &str) -> Result<Self, FontError> {
        let raw: RawTypeface = serde_json::from_str(content)?;

        if !(raw.resolution > 0.0) {
            return Err(FontError::InvalidResolution(raw.resolution));
        }

        let glyphs: HashMap<char, Glyph> = raw
            .glyphs
            .into_iter()
            .filter_map(|(key, glyph)| {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some((c, glyph)),
                    _ => None,
                }
            })
            .collect();

        if glyphs.is_empty() {
            return Err(FontError::MissingGlyphs);
        }

        Ok(Self {
            family_name: raw.family_name,
            resolution: raw.resolution,
            bounding_box: raw.bounding_box,
            underline_thickness: raw.underline_thickness,
            underline_position: raw.underline_position,
            glyphs,
        })
    }

    /// Glyph for `c`, or the `?` glyph when `c` is not defined
    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c).or_else(|| self.glyphs.get(&MISSING_GLYPH))
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}

/// Text geometry parameters
///
/// `measure_text` reads `size` and `depth`. `curve_segments` and
/// `bevel_enabled` only shape the mesh a renderer builds from the outlines
/// and are carried through unchanged for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    /// Extrusion depth along +z
    pub depth: f32,
    /// Segments per curved outline command when tessellating
    pub curve_segments: u32,
    pub bevel_enabled: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 0.4,
            depth: 0.1,
            curve_segments: 12,
            bevel_enabled: false,
        }
    }
}

/// Axis-aligned bounds of laid-out text
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TextBounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl TextBounds {
    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Translation that moves the text roughly to the origin: half of `max`
    /// on each axis, negated
    pub fn centering_offset(&self) -> [f32; 3] {
        [-self.max[0] * 0.5, -self.max[1] * 0.5, -self.max[2] * 0.5]
    }
}

/// Lay out `text` and return its bounds in scene units.
///
/// Characters the font lacks use the `?` glyph; if that is also missing the
/// character is skipped. Text with no outline points yields zero-sized
/// bounds.
pub fn measure_text(font: &TypefaceFont, text: &str, style: &TextStyle) -> TextBounds {
    let scale = style.size / font.resolution;
    let bbox = font.bounding_box;
    let line_height = (bbox.y_max - bbox.y_min + font.underline_thickness) * scale;

    let mut offset_x = 0.0f32;
    let mut offset_y = 0.0f32;
    let mut min = [f32::INFINITY; 2];
    let mut max = [f32::NEG_INFINITY; 2];

    for c in text.chars() {
        if c == '\n' {
            offset_x = 0.0;
            offset_y -= line_height;
            continue;
        }

        let Some(glyph) = font.glyph(c) else {
            continue;
        };

        for (x, y) in glyph.outline_points() {
            let px = x * scale + offset_x;
            let py = y * scale + offset_y;
            min[0] = min[0].min(px);
            min[1] = min[1].min(py);
            max[0] = max[0].max(px);
            max[1] = max[1].max(py);
        }

        offset_x += glyph.ha * scale;
    }

    if !min[0].is_finite() {
        return TextBounds::default();
    }

    TextBounds {
        min: [min[0], min[1], 0.0],
        max: [max[0], max[1], style.depth],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two square glyphs and a space, 100 units per em
    const TEST_FONT: &str = r#"{
        "familyName": "Test Sans",
        "resolution": 100,
        "underlineThickness": 10,
        "underlinePosition": -10,
        "boundingBox": { "xMin": 0, "xMax": 100, "yMin": -20, "yMax": 80 },
        "glyphs": {
            "A": { "ha": 100, "x_min": 0, "x_max": 80, "o": "m 0 0 l 80 0 l 80 80 l 0 80 z" },
            "?": { "ha": 50, "x_min": 0, "x_max": 40, "o": "m 0 0 q 40 0 20 -10 l 40 60 b 0 60 10 70 5 65" },
            " ": { "ha": 30 }
        }
    }"#;

    fn font() -> TypefaceFont {
        TypefaceFont::from_json(TEST_FONT).unwrap()
    }

    #[test]
    fn test_parse_typeface() {
        let font = font();
        assert_eq!(font.family_name, "Test Sans");
        assert_eq!(font.resolution, 100.0);
        assert_eq!(font.glyph_count(), 3);
        assert_eq!(font.bounding_box.y_max, 80.0);
    }

    #[test]
    fn test_missing_glyph_falls_back_to_question_mark() {
        let font = font();
        assert_eq!(font.glyph('Z').map(|g| g.ha), Some(50.0));
    }

    #[test]
    fn test_rejects_zero_resolution() {
        let json = r#"{ "resolution": 0, "glyphs": { "A": { "ha": 1 } } }"#;
        assert!(matches!(
            TypefaceFont::from_json(json),
            Err(FontError::InvalidResolution(_))
        ));
    }

    #[test]
    fn test_rejects_empty_glyphs() {
        let json = r#"{ "resolution": 1000, "glyphs": {} }"#;
        assert!(matches!(TypefaceFont::from_json(json), Err(FontError::MissingGlyphs)));
    }

    #[test]
    fn test_outline_points_skip_control_points() {
        let font = font();
        let points = font.glyph('?').unwrap().outline_points();
        assert_eq!(points, vec![(0.0, 0.0), (40.0, 0.0), (40.0, 60.0), (0.0, 60.0)]);
    }

    #[test]
    fn test_measure_single_line() {
        let font = font();
        let style = TextStyle { size: 1.0, depth: 0.2, ..TextStyle::default() };

        // "A A": second A starts after 100 + 30 units
        let bounds = measure_text(&font, "A A", &style);

        assert_eq!(bounds.min, [0.0, 0.0, 0.0]);
        assert!((bounds.max[0] - 2.1).abs() < 1e-5);
        assert!((bounds.max[1] - 0.8).abs() < 1e-5);
        assert_eq!(bounds.max[2], 0.2);
    }

    #[test]
    fn test_measure_multiline_moves_down() {
        let font = font();
        let style = TextStyle { size: 1.0, ..TextStyle::default() };

        let bounds = measure_text(&font, "A\nA", &style);

        // line height = (80 - -20 + 10) / 100
        assert!((bounds.min[1] + 1.1).abs() < 1e-5);
        assert!((bounds.max[0] - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_centering_offset_halves_max() {
        let bounds = TextBounds {
            min: [0.0, 0.0, 0.0],
            max: [2.0, 0.5, 0.1],
        };
        assert_eq!(bounds.centering_offset(), [-1.0, -0.25, -0.05]);
    }

    #[test]
    fn test_tessellation_settings_do_not_change_bounds() {
        let font = font();
        let coarse = TextStyle { curve_segments: 1, ..TextStyle::default() };
        let beveled = TextStyle { curve_segments: 64, bevel_enabled: true, ..TextStyle::default() };

        assert_eq!(
            measure_text(&font, "A?", &coarse),
            measure_text(&font, "A?", &beveled)
        );
    }

    #[test]
    fn test_whitespace_only_has_empty_bounds() {
        let font = font();
        let bounds = measure_text(&font, "   ", &TextStyle::default());
        assert_eq!(bounds, TextBounds::default());
    }
}
