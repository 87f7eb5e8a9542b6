//! Bitmap tile-atlas font rendering.
//!
//! Glyphs come from fixed 16x16 grids of pixel-art tiles. Metrics are
//! measured from the atlas pixels, text is laid out on a single line mixing
//! a narrow 8x8 pack with on-demand 16x16 wide packs, and quads are batched
//! per texture into a wgpu render target.

pub mod atlas;
pub mod color;
pub mod config;
pub mod error;
pub mod gpu;
pub mod layout;

pub use atlas::{AtlasSource, DirSource, MemorySource, PackKey, PackKeySet};
pub use config::RendererConfig;
pub use error::{LoadError, RenderError};
pub use gpu::{FontRenderer, GpuContext, TextSurface};
pub use layout::{Align, Baseline, DrawOptions, Mode, TextLayout, VAlign};
