//! Glyph metrics inferred from atlas pixels.
//!
//! The atlases carry no font metadata, so horizontal advance and the
//! vertical visual center are measured from the alpha channel once per pack.

use image::RgbaImage;

use super::{GRID, GLYPH_SLOTS, TileSize};

/// Row-major alpha channel of a whole atlas, one byte per pixel.
pub struct AlphaScan {
    alpha: Vec<u8>,
    width: u32,
    height: u32,
}

impl AlphaScan {
    /// Isolate the alpha channel of a decoded atlas.
    pub fn from_rgba(image: &RgbaImage) -> Self {
        Self {
            alpha: image.pixels().map(|p| p.0[3]).collect(),
            width: image.width(),
            height: image.height(),
        }
    }

    /// Wrap a raw alpha buffer. `None` unless `alpha.len() == width * height`.
    pub fn from_alpha(width: u32, height: u32, alpha: Vec<u8>) -> Option<Self> {
        (alpha.len() == (width as usize) * (height as usize)).then_some(Self {
            alpha,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn opaque(&self, x: u32, y: u32) -> bool {
        self.alpha[(y * self.width + x) as usize] > 0
    }

    fn column_has_opaque(&self, x: u32, y0: u32, y1: u32) -> bool {
        (y0..=y1).any(|y| self.opaque(x, y))
    }

    fn row_has_opaque(&self, y: u32, x0: u32, x1: u32) -> bool {
        (x0..=x1).any(|x| self.opaque(x, y))
    }
}

/// Pixel bounds of grid slot `idx`: `(x0, y0, x1, y1)`, inclusive.
fn slot_bounds(idx: usize, tile: TileSize) -> (u32, u32, u32, u32) {
    let cx = (idx % GRID) as u32;
    let cy = (idx / GRID) as u32;
    let x0 = cx * tile.w;
    let y0 = cy * tile.h;
    (x0, y0, x0 + tile.w - 1, y0 + tile.h - 1)
}

/// Per-slot horizontal advance.
///
/// Visible width (leftmost to rightmost opaque column) plus one pixel of
/// trailing padding; `tile.w` for a slot with no opaque pixel.
pub fn build_advance(scan: &AlphaScan, tile: TileSize) -> [u16; GLYPH_SLOTS] {
    let mut advance = [0u16; GLYPH_SLOTS];
    for (idx, adv) in advance.iter_mut().enumerate() {
        let (x0, y0, x1, y1) = slot_bounds(idx, tile);
        let left = (x0..=x1).find(|&x| scan.column_has_opaque(x, y0, y1));
        let right = (x0..=x1).rev().find(|&x| scan.column_has_opaque(x, y0, y1));
        *adv = match (left, right) {
            (Some(l), Some(r)) => (r - l + 1 + 1) as u16,
            _ => tile.w as u16,
        };
    }
    advance
}

/// Pack-wide vertical reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalMetrics {
    /// Mean midpoint row (tile-local) of visible pixels over non-empty slots.
    pub center_row: f32,
}

/// Average the top/bottom midpoint of every non-empty slot.
///
/// Falls back to `tile.h / 2` when the whole atlas is transparent.
pub fn build_vertical_metrics(scan: &AlphaScan, tile: TileSize) -> VerticalMetrics {
    let mut sum = 0.0f32;
    let mut count = 0u32;
    for idx in 0..GLYPH_SLOTS {
        let (x0, y0, x1, y1) = slot_bounds(idx, tile);
        let top = (y0..=y1).find(|&y| scan.row_has_opaque(y, x0, x1));
        let bottom = (y0..=y1).rev().find(|&y| scan.row_has_opaque(y, x0, x1));
        if let (Some(t), Some(b)) = (top, bottom) {
            sum += (t + b) as f32 / 2.0 - y0 as f32;
            count += 1;
        }
    }
    let center_row = if count > 0 {
        sum / count as f32
    } else {
        tile.h as f32 / 2.0
    };
    VerticalMetrics { center_row }
}

/// Everything layout needs to know about one pack.
#[derive(Debug, Clone, PartialEq)]
pub struct PackMetrics {
    pub width: u32,
    pub height: u32,
    pub tile: TileSize,
    pub advance: [u16; GLYPH_SLOTS],
    pub center_row: f32,
}

impl PackMetrics {
    pub fn from_scan(scan: &AlphaScan, tile: TileSize) -> Self {
        Self {
            width: scan.width(),
            height: scan.height(),
            tile,
            advance: build_advance(scan, tile),
            center_row: build_vertical_metrics(scan, tile).center_row,
        }
    }

    pub fn advance(&self, slot: u8) -> u16 {
        self.advance[usize::from(slot)]
    }

    /// Normalized texture rectangle `[u0, v0, u1, v1]` of a grid slot.
    pub fn cell_uv(&self, slot: u8) -> [f32; 4] {
        let cx = u32::from(slot) % GRID as u32;
        let cy = u32::from(slot) / GRID as u32;
        let w = self.width as f32;
        let h = self.height as f32;
        [
            (cx * self.tile.w) as f32 / w,
            (cy * self.tile.h) as f32 / h,
            ((cx + 1) * self.tile.w) as f32 / w,
            ((cy + 1) * self.tile.h) as f32 / h,
        ]
    }
}
