//! GPU rendering: headless context, text pipeline, pack textures, and the
//! offscreen surface the renderer draws into.

pub mod context;
pub mod pipeline;
pub mod renderer;
pub mod surface;
pub mod texture;
mod vertex_writer;

pub use context::GpuContext;
pub use renderer::FontRenderer;
pub use surface::{TextSurface, backing_size};
pub use texture::PackTexture;
