//! Draw options and their defaults.

use serde::{Deserialize, Serialize};

/// Horizontal anchor relative to `x`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchor relative to `y`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Character-class policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// `Default` for pure-ASCII text, `Mixed` otherwise.
    #[default]
    Auto,
    /// Every character through the narrow pack.
    Default,
    /// Every character through the wide packs.
    Glyph,
    /// Wide packs above 0x7F, narrow pack otherwise.
    Mixed,
}

/// Which pack's vertical center defines the shared line reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
    #[default]
    Ascii,
    Glyph,
    Auto,
}

/// Options for one `draw` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawOptions {
    /// "#RRGGBB" hex.
    pub color: String,
    pub align: Align,
    pub valign: VAlign,
    /// Anchor in surface pixels, origin top-left.
    pub x: f32,
    pub y: f32,
    /// Clear the surface to transparent before drawing.
    pub clear: bool,
    /// Pixel magnification.
    pub scale: f32,
    /// Draw an offset dark copy beneath the text.
    pub shadow: bool,
    /// Extra scale for narrow-pack glyphs only.
    pub ds: f32,
    pub space_mul: f32,
    pub spacing_mul: f32,
    pub mode: Mode,
    pub baseline: Baseline,
    /// Fixed line height regardless of content.
    pub lock_line_h: bool,
    /// Gap between consecutive wide glyphs, in unscaled pixels.
    pub glyph_track_px: f32,
    /// Gap before a narrow glyph that follows a wide one (mixed text only).
    pub ascii_after_glyph_pad_px: f32,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            color: "#ffffff".to_owned(),
            align: Align::Left,
            valign: VAlign::Top,
            x: 0.0,
            y: 0.0,
            clear: true,
            scale: 2.0,
            shadow: true,
            ds: 1.5,
            space_mul: 0.5,
            spacing_mul: 1.0,
            mode: Mode::Auto,
            baseline: Baseline::Ascii,
            lock_line_h: true,
            glyph_track_px: 2.0,
            ascii_after_glyph_pad_px: 2.5,
        }
    }
}

impl DrawOptions {
    /// Same options anchored at `(x, y)`.
    pub fn at(&self, x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..self.clone()
        }
    }
}
