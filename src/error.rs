//! Error taxonomy for renderer setup, atlas loading, and surface readback.

use thiserror::Error;

/// Failure to produce a decoded atlas from its source.
///
/// Raised per load job. Fatal for the narrow pack (propagates out of
/// `init`), recorded and swallowed for wide packs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to fetch {name}: {reason}")]
    Fetch { name: String, reason: String },

    #[error("failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },

    #[error("{name}: {width}x{height} image is too small for a 16x16 grid of {tile_w}x{tile_h} tiles")]
    Geometry {
        name: String,
        width: u32,
        height: u32,
        tile_w: u32,
        tile_h: u32,
    },
}

/// Top-level renderer error.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No usable GPU adapter or device.
    #[error("graphics context unavailable: {0}")]
    Context(String),

    /// WGSL source failed to parse or validate.
    #[error("shader compile failed: {0}")]
    Compile(String),

    /// Shader module lacks a stage entry point the pipeline needs.
    #[error("shader program link failed: {0}")]
    Link(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("surface readback failed: {0}")]
    Readback(String),
}
