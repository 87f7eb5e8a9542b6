//! Synthetic atlases for unit tests.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use super::metrics::{AlphaScan, PackMetrics};
use super::{GRID, TileSize};

const INK: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Draws opaque pixels into an otherwise transparent 16x16-tile grid.
pub(crate) struct AtlasBuilder {
    tile: TileSize,
    image: RgbaImage,
}

impl AtlasBuilder {
    pub(crate) fn new(tile: TileSize) -> Self {
        Self {
            tile,
            image: RgbaImage::new(tile.w * GRID as u32, tile.h * GRID as u32),
        }
    }

    /// One opaque pixel at tile-local `(x, y)` of `slot`.
    pub(crate) fn pixel(mut self, slot: u8, x: u32, y: u32) -> Self {
        let (x0, y0) = self.origin(slot);
        self.image.put_pixel(x0 + x, y0 + y, INK);
        self
    }

    /// Opaque rectangle, tile-local and inclusive.
    pub(crate) fn block(mut self, slot: u8, left: u32, top: u32, right: u32, bottom: u32) -> Self {
        let (x0, y0) = self.origin(slot);
        for y in top..=bottom {
            for x in left..=right {
                self.image.put_pixel(x0 + x, y0 + y, INK);
            }
        }
        self
    }

    /// Columns `left..=right` over the full tile height.
    pub(crate) fn fill_slot(self, slot: u8, left: u32, right: u32) -> Self {
        let bottom = self.tile.h - 1;
        self.block(slot, left, 0, right, bottom)
    }

    pub(crate) fn metrics(&self) -> PackMetrics {
        PackMetrics::from_scan(&AlphaScan::from_rgba(&self.image), self.tile)
    }

    pub(crate) fn png(&self) -> Vec<u8> {
        encode_png(&self.image)
    }

    fn origin(&self, slot: u8) -> (u32, u32) {
        let cx = u32::from(slot) % GRID as u32;
        let cy = u32::from(slot) / GRID as u32;
        (cx * self.tile.w, cy * self.tile.h)
    }
}

pub(crate) fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}
