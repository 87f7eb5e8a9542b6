//! Tile-grid glyph atlases: fetching, decoding, pixel fixups, metrics, and
//! the pack cache.
//!
//! Every atlas is a 16x16 grid of equally sized tiles. The single narrow
//! pack (`default8.png`, 8x8 tiles) covers one byte of codepoints; each wide
//! pack (`glyph_<HH>.png`, 16x16 tiles) covers the 256 codepoints sharing a
//! high byte.

pub mod cache;
pub mod fixups;
pub mod key;
pub mod metrics;
pub mod pack;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::LoadError;

pub use cache::PackCache;
pub use fixups::{QuoteAlternates, QuoteMark};
pub use key::{PackKey, PackKeySet};
pub use metrics::{AlphaScan, PackMetrics, VerticalMetrics, build_advance, build_vertical_metrics};
pub use pack::{Pack, PackId, PackSet};

/// Columns (and rows) of every atlas grid.
pub const GRID: usize = 16;

/// Glyph slots per atlas.
pub const GLYPH_SLOTS: usize = GRID * GRID;

/// File name of the mandatory narrow pack.
pub const NARROW_ATLAS: &str = "default8.png";

/// Pixel size of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSize {
    pub w: u32,
    pub h: u32,
}

impl TileSize {
    pub const NARROW: Self = Self { w: 8, h: 8 };
    pub const WIDE: Self = Self { w: 16, h: 16 };
}

/// Where atlas images come from.
///
/// Implementations must be shareable across the loader threads.
pub trait AtlasSource: Send + Sync {
    /// Return the encoded image bytes stored under `name`.
    fn fetch(&self, name: &str) -> Result<Vec<u8>, LoadError>;
}

/// Reads atlases from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    base: PathBuf,
}

impl DirSource {
    /// A trailing separator on `base` is ignored.
    pub fn new(base: impl AsRef<Path>) -> Self {
        let raw = base.as_ref().to_string_lossy();
        let trimmed = raw.trim_end_matches('/');
        let base = if trimmed.is_empty() && !raw.is_empty() {
            PathBuf::from("/")
        } else {
            PathBuf::from(trimmed)
        };
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl AtlasSource for DirSource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.base.join(name);
        std::fs::read(&path).map_err(|e| LoadError::Fetch {
            name: name.to_owned(),
            reason: format!("{}: {e}", path.display()),
        })
    }
}

/// In-memory atlases keyed by file name. Handy for embedded assets.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }

    pub fn with(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl AtlasSource for MemorySource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, LoadError> {
        self.files.get(name).cloned().ok_or_else(|| LoadError::Fetch {
            name: name.to_owned(),
            reason: "no such atlas".to_owned(),
        })
    }
}

/// A decoded, measured atlas ready for texture upload.
pub struct DecodedAtlas {
    pub image: RgbaImage,
    pub metrics: PackMetrics,
    /// Present only for the narrow pack.
    pub quote_alternates: Option<QuoteAlternates>,
}

/// Fetch and decode an atlas, then measure it.
pub fn load_atlas(
    source: &dyn AtlasSource,
    name: &str,
    tile: TileSize,
    narrow: bool,
) -> Result<DecodedAtlas, LoadError> {
    let bytes = source.fetch(name)?;
    decode_atlas(name, &bytes, tile, narrow)
}

/// Decode encoded image bytes at native size and derive metrics.
///
/// For the narrow pack the comma fix is applied before measuring, and the
/// quote alternates are cut from the corrected image.
pub fn decode_atlas(
    name: &str,
    bytes: &[u8],
    tile: TileSize,
    narrow: bool,
) -> Result<DecodedAtlas, LoadError> {
    let mut image = image::load_from_memory(bytes)
        .map_err(|e| LoadError::Decode {
            name: name.to_owned(),
            reason: e.to_string(),
        })?
        .into_rgba8();

    let (width, height) = image.dimensions();
    if width < tile.w * GRID as u32 || height < tile.h * GRID as u32 {
        return Err(LoadError::Geometry {
            name: name.to_owned(),
            width,
            height,
            tile_w: tile.w,
            tile_h: tile.h,
        });
    }

    let quote_alternates = if narrow && tile == TileSize::NARROW {
        fixups::nudge_comma(&mut image, tile);
        Some(QuoteAlternates::build(&image, tile))
    } else {
        None
    };

    let scan = AlphaScan::from_rgba(&image);
    let metrics = PackMetrics::from_scan(&scan, tile);
    log::debug!(
        "atlas {name}: {width}x{height}, center_row={:.2}",
        metrics.center_row
    );

    Ok(DecodedAtlas {
        image,
        metrics,
        quote_alternates,
    })
}

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests {
    use super::testing::{AtlasBuilder, encode_png};
    use super::*;

    #[test]
    fn dir_source_trims_trailing_slash() {
        assert_eq!(DirSource::new("./images/font/").base(), Path::new("./images/font"));
        assert_eq!(DirSource::new("assets").base(), Path::new("assets"));
        assert_eq!(DirSource::new("/").base(), Path::new("/"));
    }

    #[test]
    fn dir_source_reads_files() {
        let dir = std::env::temp_dir().join(format!("tilefont-dir-source-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("glyph_0A.png"), b"bytes").expect("write");

        let source = DirSource::new(&dir);
        assert_eq!(source.fetch("glyph_0A.png").expect("fetch"), b"bytes");
        let err = source.fetch("glyph_0B.png").expect_err("missing file");
        assert!(matches!(err, LoadError::Fetch { ref name, .. } if name == "glyph_0B.png"));

        std::fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn memory_source_missing_name_is_fetch_error() {
        let source = MemorySource::new().with("a.png", vec![1, 2, 3]);
        assert_eq!(source.fetch("a.png").expect("fetch"), vec![1, 2, 3]);
        assert!(matches!(source.fetch("b.png"), Err(LoadError::Fetch { .. })));
    }

    #[test]
    fn garbage_bytes_are_decode_error() {
        let err = decode_atlas("glyph_00.png", b"not a png", TileSize::WIDE, false)
            .err()
            .expect("decode should fail");
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn undersized_image_is_geometry_error() {
        let png = encode_png(&RgbaImage::new(64, 64));
        let err = decode_atlas("glyph_00.png", &png, TileSize::WIDE, false)
            .err()
            .expect("too small");
        assert!(matches!(err, LoadError::Geometry { width: 64, height: 64, .. }));
    }

    #[test]
    fn narrow_decode_measures_corrected_atlas() {
        // Comma: a single pixel on row 5 at column 6. After the fix it sits
        // at column 7, so the measured width stays 1 but moves right.
        let png = AtlasBuilder::new(TileSize::NARROW)
            .pixel(b',', 6, 5)
            .pixel(b'"', 2, 0)
            .png();
        let decoded = decode_atlas(NARROW_ATLAS, &png, TileSize::NARROW, true).expect("decode");
        let (x0, y0) = (12 * 8, 2 * 8);
        assert_eq!(decoded.image.get_pixel(x0 + 7, y0 + 5).0[3], 255);
        assert_eq!(decoded.image.get_pixel(x0 + 6, y0 + 5).0[3], 0);
        assert_eq!(decoded.metrics.advance(b','), 2);

        let alts = decoded.quote_alternates.expect("narrow pack has alternates");
        assert_eq!(alts.get(QuoteMark::Double).get_pixel(1, 0).0[3], 255);
    }

    #[test]
    fn wide_decode_has_no_alternates() {
        let png = AtlasBuilder::new(TileSize::WIDE).fill_slot(0x41, 2, 13).png();
        let decoded = decode_atlas("glyph_00.png", &png, TileSize::WIDE, false).expect("decode");
        assert!(decoded.quote_alternates.is_none());
        assert_eq!(decoded.metrics.width, 256);
        assert_eq!(decoded.metrics.advance(0x41), 13);
        assert_eq!(decoded.metrics.advance(0x42), 16);
    }
}
