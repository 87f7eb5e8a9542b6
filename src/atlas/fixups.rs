//! Pixel-level corrections for the shipped narrow atlas.
//!
//! Both fixups are fixed data tied to `default8.png`: the comma's lower
//! stroke is nudged right, and opening quote marks get a slanted variant.

use image::{Rgba, RgbaImage};

use super::{GRID, TileSize};

const COMMA: u8 = b',';

/// Tile-local rows of the comma that move one pixel right.
const COMMA_ROWS: [u32; 2] = [5, 6];

/// Horizontal shift applied to each tile row of an opening quote.
pub const QUOTE_ROW_SHIFTS: [i32; 8] = [-1, -1, 1, 0, 0, 0, 0, 0];

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Quote marks that have an alternate "opening" glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteMark {
    Double,
    Single,
}

impl QuoteMark {
    pub const ALL: [Self; 2] = [Self::Double, Self::Single];

    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '"' => Some(Self::Double),
            '\'' => Some(Self::Single),
            _ => None,
        }
    }

    /// Narrow-pack slot of the base glyph.
    pub fn slot(self) -> u8 {
        match self {
            Self::Double => b'"',
            Self::Single => b'\'',
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Double => 0,
            Self::Single => 1,
        }
    }
}

/// Top-left pixel of `slot` in a 16-column grid.
fn slot_origin(slot: u8, tile: TileSize) -> (u32, u32) {
    let cx = u32::from(slot) % GRID as u32;
    let cy = u32::from(slot) / GRID as u32;
    (cx * tile.w, cy * tile.h)
}

/// Shift the opaque pixels of the comma's two lowest stroke rows one column right.
pub fn nudge_comma(atlas: &mut RgbaImage, tile: TileSize) {
    let (x0, y0) = slot_origin(COMMA, tile);
    let snapshot: Vec<Rgba<u8>> = (0..tile.h)
        .flat_map(|y| (0..tile.w).map(move |x| (x, y)))
        .map(|(x, y)| *atlas.get_pixel(x0 + x, y0 + y))
        .collect();
    let src = |x: u32, y: u32| snapshot[(y * tile.w + x) as usize];

    for &row in COMMA_ROWS.iter().filter(|&&r| r < tile.h) {
        for px in (0..tile.w - 1).rev() {
            let pixel = src(px, row);
            if pixel.0[3] > 0 {
                atlas.put_pixel(x0 + px + 1, y0 + row, pixel);
                atlas.put_pixel(x0 + px, y0 + row, TRANSPARENT);
            }
        }
    }
}

/// Build a standalone `tile`-sized bitmap of `slot` with each row shifted
/// per `QUOTE_ROW_SHIFTS`. Pixels shifted in from outside stay transparent.
pub fn quote_alternate(atlas: &RgbaImage, tile: TileSize, slot: u8) -> RgbaImage {
    let (x0, y0) = slot_origin(slot, tile);
    let mut out = RgbaImage::from_pixel(tile.w, tile.h, TRANSPARENT);

    for y in 0..tile.h {
        let shift = QUOTE_ROW_SHIFTS.get(y as usize).copied().unwrap_or(0);
        let columns: Vec<u32> = match shift {
            0 => (0..tile.w).collect(),
            s if s < 0 => (1..tile.w).collect(),
            _ => (0..tile.w - 1).rev().collect(),
        };
        for x in columns {
            let dx = x as i32 + shift;
            if (0..tile.w as i32).contains(&dx) {
                out.put_pixel(dx as u32, y, *atlas.get_pixel(x0 + x, y0 + y));
            }
        }
    }
    out
}

/// Opening-quote bitmaps derived from the corrected narrow atlas.
pub struct QuoteAlternates {
    pub double: RgbaImage,
    pub single: RgbaImage,
}

impl QuoteAlternates {
    pub fn build(atlas: &RgbaImage, tile: TileSize) -> Self {
        Self {
            double: quote_alternate(atlas, tile, QuoteMark::Double.slot()),
            single: quote_alternate(atlas, tile, QuoteMark::Single.slot()),
        }
    }

    pub fn get(&self, mark: QuoteMark) -> &RgbaImage {
        match mark {
            QuoteMark::Double => &self.double,
            QuoteMark::Single => &self.single,
        }
    }
}
