//! The font renderer: owns the surface, the loaded packs, and the text
//! pipeline, and turns `draw` calls into shadow + color passes.

use std::sync::Arc;

use image::RgbaImage;
use winit::dpi::LogicalSize;

use crate::atlas::{
    AtlasSource, NARROW_ATLAS, Pack, PackKey, PackKeySet, PackSet, QuoteMark, TileSize, load_atlas,
};
use crate::color::{SHADOW_COLOR, WHITE, hex_to_rgba};
use crate::error::{LoadError, RenderError};
use crate::layout::{self, DrawOptions, TextLayout};

use super::context::GpuContext;
use super::pipeline::{TEXT_SHADER_SRC, TextPipeline, UNIFORM_SIZE};
use super::surface::TextSurface;
use super::texture::{PackTexture, TEXTURE_FORMAT, create_pixel_sampler, upload_rgba};
use super::vertex_writer::{VertexWriter, reuse_or_create_buffer};

/// One uniform buffer and its bind group. The shadow and color passes each
/// own one so a single vertex buffer per run serves both.
struct PassUniforms {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl PassUniforms {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: UNIFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

/// Everything that exists only after a successful `init`.
struct RendererState {
    gpu: Arc<GpuContext>,
    pipeline: TextPipeline,
    sampler: wgpu::Sampler,
    packs: PackSet<PackTexture>,
    shadow_pass: PassUniforms,
    color_pass: PassUniforms,
    /// Vertex buffers reused across draws, one per run index.
    vertex_buffers: Vec<wgpu::Buffer>,
    writer: VertexWriter,
}

/// Bitmap-font text renderer drawing into an offscreen [`TextSurface`].
pub struct FontRenderer {
    surface: TextSurface,
    source: Box<dyn AtlasSource>,
    state: Option<RendererState>,
}

impl FontRenderer {
    /// An uninitialized renderer. Nothing touches the GPU until `init`.
    pub fn new(surface: TextSurface, source: impl AtlasSource + 'static) -> Self {
        Self {
            surface,
            source: Box::new(source),
            state: None,
        }
    }

    /// Acquire a headless GPU context, then initialize on it.
    pub fn init(&mut self) -> Result<(), RenderError> {
        let gpu = GpuContext::headless()?;
        self.init_with_context(Arc::new(gpu))
    }

    /// Build the pipeline, load the narrow pack, and size the surface.
    ///
    /// Fails if the shader does not validate or `default8.png` cannot be
    /// loaded; the renderer stays uninitialized in that case.
    pub fn init_with_context(&mut self, gpu: Arc<GpuContext>) -> Result<(), RenderError> {
        let device = &gpu.device;
        let pipeline = TextPipeline::new(device, TEXTURE_FORMAT, TEXT_SHADER_SRC)?;
        let sampler = create_pixel_sampler(device);

        let decoded = load_atlas(self.source.as_ref(), NARROW_ATLAS, TileSize::NARROW, true)?;
        let texture = upload_rgba(
            device,
            &gpu.queue,
            &pipeline.atlas_layout,
            &sampler,
            &decoded.image,
            "narrow_pack",
        );
        let mut packs = PackSet::new(Pack {
            metrics: decoded.metrics,
            texture,
        });
        if let Some(alternates) = &decoded.quote_alternates {
            for mark in QuoteMark::ALL {
                let texture = upload_rgba(
                    device,
                    &gpu.queue,
                    &pipeline.atlas_layout,
                    &sampler,
                    alternates.get(mark),
                    "quote_alternate",
                );
                packs.set_quote_alternate(mark, texture);
            }
        }

        let shadow_pass = PassUniforms::new(device, &pipeline.uniform_layout, "shadow_uniforms");
        let color_pass = PassUniforms::new(device, &pipeline.uniform_layout, "color_uniforms");
        self.surface.configure(device);

        log::info!(
            "renderer: initialized ({}x{} narrow pack)",
            packs.narrow().metrics.width,
            packs.narrow().metrics.height
        );
        self.state = Some(RendererState {
            gpu,
            pipeline,
            sampler,
            packs,
            shadow_pass,
            color_pass,
            vertex_buffers: Vec::new(),
            writer: VertexWriter::new(),
        });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn surface(&self) -> &TextSurface {
        &self.surface
    }

    /// The context this renderer draws with, for sharing with another renderer.
    pub fn gpu(&self) -> Option<&Arc<GpuContext>> {
        self.state.as_ref().map(|s| &s.gpu)
    }

    pub fn set_display_size(&mut self, display: LogicalSize<f64>) {
        self.surface.set_display_size(display);
    }

    pub fn set_device_pixel_ratio(&mut self, dpr: f64) {
        self.surface.set_device_pixel_ratio(dpr);
    }

    /// Recreate the target if the backing size changed. Returns true when it did.
    ///
    /// No-op before `init` or while the displayed size is zero.
    pub fn resize(&mut self) -> bool {
        let Some(state) = &self.state else {
            return false;
        };
        self.surface.configure(&state.gpu.device)
    }

    /// Load every wide pack in `keys` not attempted before.
    ///
    /// Returns this call's failures; they are also logged, and a failed key
    /// is never retried.
    pub fn ensure_packs(&mut self, keys: &PackKeySet) -> Vec<(PackKey, LoadError)> {
        match self.state.as_mut() {
            Some(state) => ensure_wide_packs(state, self.source.as_ref(), keys),
            None => {
                log::warn!("ensure_packs before init ignored");
                Vec::new()
            }
        }
    }

    /// Wide packs currently loaded.
    pub fn loaded_pack_count(&self) -> usize {
        self.state
            .as_ref()
            .map_or(0, |s| s.packs.wide_cache().loaded_count())
    }

    /// Lay out `text` without drawing. Loads any wide packs it needs.
    pub fn measure(&mut self, text: &str, opts: &DrawOptions) -> Option<TextLayout> {
        let state = self.state.as_mut()?;
        ensure_wide_packs(state, self.source.as_ref(), &layout::required_keys(text, opts.mode));
        Some(layout::layout(text, opts, &state.packs))
    }

    /// Draw one line of text.
    ///
    /// Before `init`, or without a backing texture, this logs and does nothing.
    pub fn draw(&mut self, text: &str, opts: &DrawOptions) {
        let Some(state) = self.state.as_mut() else {
            log::warn!("draw before init ignored: {text:?}");
            return;
        };
        let (Some(view), Some(size)) = (self.surface.view(), self.surface.size()) else {
            log::debug!("draw skipped: surface has no backing texture");
            return;
        };

        ensure_wide_packs(state, self.source.as_ref(), &layout::required_keys(text, opts.mode));
        let text_layout = layout::layout(text, opts, &state.packs);

        let color = hex_to_rgba(&opts.color).unwrap_or_else(|| {
            log::warn!("draw: invalid color {:?}, using white", opts.color);
            WHITE
        });
        let projection = ortho_projection(size.width as f32, size.height as f32);
        let offset = shadow_offset(opts.scale);
        let queue = &state.gpu.queue;
        queue.write_buffer(
            &state.shadow_pass.buffer,
            0,
            &uniform_bytes(&projection, SHADOW_COLOR, [offset, offset]),
        );
        queue.write_buffer(
            &state.color_pass.buffer,
            0,
            &uniform_bytes(&projection, color, [0.0, 0.0]),
        );

        // One vertex buffer per run, reusing last draw's buffers by index.
        let mut pool = std::mem::take(&mut state.vertex_buffers).into_iter();
        let mut buffers = Vec::with_capacity(text_layout.runs.len());
        let mut counts = Vec::with_capacity(text_layout.runs.len());
        for run in &text_layout.runs {
            state.writer.clear();
            for span in text_layout.run_spans(run) {
                state.writer.push_span(&text_layout, span);
            }
            buffers.push(reuse_or_create_buffer(
                &state.gpu.device,
                queue,
                pool.next(),
                state.writer.as_bytes(),
                "run_vertices",
            ));
            counts.push(state.writer.vertex_count());
        }

        let mut encoder = state
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("text_encoder"),
            });
        {
            let load = if opts.clear {
                wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
            } else {
                wgpu::LoadOp::Load
            };
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("text_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(&state.pipeline.pipeline);
            let shadow = opts.shadow.then_some(&state.shadow_pass);
            for pass in shadow.into_iter().chain([&state.color_pass]) {
                rpass.set_bind_group(0, &pass.bind_group, &[]);
                for ((run, buffer), &count) in text_layout.runs.iter().zip(&buffers).zip(&counts) {
                    let Some(texture) = state.packs.texture(run.pack) else {
                        continue;
                    };
                    rpass.set_bind_group(1, texture.bind_group(), &[]);
                    rpass.set_vertex_buffer(0, buffer.slice(..));
                    rpass.draw(0..count, 0..1);
                }
            }
        }
        queue.submit(std::iter::once(encoder.finish()));

        buffers.extend(pool);
        state.vertex_buffers = buffers;
    }

    /// Copy the surface into host memory.
    pub fn read_pixels(&self) -> Result<RgbaImage, RenderError> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| RenderError::Readback("renderer not initialized".to_owned()))?;
        self.surface.read_pixels(&state.gpu)
    }
}

/// Fetch and decode missing packs in parallel, then upload them in key order.
fn ensure_wide_packs(
    state: &mut RendererState,
    source: &dyn AtlasSource,
    keys: &PackKeySet,
) -> Vec<(PackKey, LoadError)> {
    let gpu = &state.gpu;
    let layout = &state.pipeline.atlas_layout;
    let sampler = &state.sampler;
    state.packs.ensure_wide(
        keys,
        |key| load_atlas(source, &key.file_name(), TileSize::WIDE, false),
        |key, decoded| Pack {
            texture: upload_rgba(
                &gpu.device,
                &gpu.queue,
                layout,
                sampler,
                &decoded.image,
                &key.file_name(),
            ),
            metrics: decoded.metrics,
        },
    )
}

/// Shadow displacement on both axes, rounded like every other pixel value.
fn shadow_offset(scale: f32) -> f32 {
    layout::round_half_up(scale)
}

/// Pixel-space orthographic projection: (0, 0) top-left, (w, h) bottom-right.
fn ortho_projection(w: f32, h: f32) -> [u8; 64] {
    let proj: [f32; 16] = [
        2.0 / w,
        0.0,
        0.0,
        0.0,
        0.0,
        -2.0 / h,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
        -1.0,
        1.0,
        0.0,
        1.0,
    ];

    let mut bytes = [0u8; 64];
    for (i, &v) in proj.iter().enumerate() {
        bytes[i * 4..i * 4 + 4].copy_from_slice(&v.to_ne_bytes());
    }
    bytes
}

/// Uniform block bytes, laid out as documented on [`UNIFORM_SIZE`].
fn uniform_bytes(
    projection: &[u8; 64],
    color: [f32; 4],
    offset: [f32; 2],
) -> [u8; UNIFORM_SIZE as usize] {
    let mut bytes = [0u8; UNIFORM_SIZE as usize];
    bytes[..64].copy_from_slice(projection);
    for (i, &v) in color.iter().chain(offset.iter()).enumerate() {
        let at = 64 + i * 4;
        bytes[at..at + 4].copy_from_slice(&v.to_ne_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::MemorySource;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    /// Apply the column-major matrix to `(x, y, 0, 1)`.
    fn project(m: &[f32], x: f32, y: f32) -> (f32, f32) {
        (m[0] * x + m[4] * y + m[12], m[1] * x + m[5] * y + m[13])
    }

    #[test]
    fn shadow_offset_rounds_half_up() {
        assert_eq!(shadow_offset(2.0), 2.0);
        assert_eq!(shadow_offset(2.5), 3.0);
        assert_eq!(shadow_offset(1.4), 1.0);
        assert_eq!(shadow_offset(-1.5), -1.0);
    }

    #[test]
    fn ortho_maps_pixel_corners_to_clip_space() {
        let m = floats(&ortho_projection(256.0, 128.0));
        assert_eq!(project(&m, 0.0, 0.0), (-1.0, 1.0));
        assert_eq!(project(&m, 256.0, 128.0), (1.0, -1.0));
        assert_eq!(project(&m, 128.0, 64.0), (0.0, 0.0));
    }

    #[test]
    fn uniform_layout() {
        let proj = ortho_projection(64.0, 64.0);
        let bytes = uniform_bytes(&proj, SHADOW_COLOR, [2.0, 2.0]);
        assert_eq!(&bytes[..64], &proj[..]);
        let tail = floats(&bytes[64..]);
        assert_eq!(&tail[..4], &SHADOW_COLOR[..]);
        assert_eq!(&tail[4..6], &[2.0, 2.0]);
        assert_eq!(&tail[6..], &[0.0, 0.0]);
    }

    fn uninitialized() -> FontRenderer {
        FontRenderer::new(
            TextSurface::new(LogicalSize::new(128.0, 128.0), 1.0),
            MemorySource::new(),
        )
    }

    #[test]
    fn calls_before_init_are_no_ops() {
        let mut renderer = uninitialized();
        assert!(!renderer.is_initialized());
        assert!(renderer.gpu().is_none());

        renderer.draw("Hi", &DrawOptions::default());
        assert!(renderer.measure("Hi", &DrawOptions::default()).is_none());
        assert!(!renderer.resize());

        let mut keys = PackKeySet::new();
        keys.insert(PackKey::BASE);
        assert!(renderer.ensure_packs(&keys).is_empty());
        assert_eq!(renderer.loaded_pack_count(), 0);

        assert!(matches!(renderer.read_pixels(), Err(RenderError::Readback(_))));
        assert_eq!(renderer.surface().size(), None);
    }

    #[test]
    fn size_inputs_apply_before_init() {
        let mut renderer = uninitialized();
        renderer.set_device_pixel_ratio(1.5);
        renderer.set_display_size(LogicalSize::new(100.0, 20.0));
        assert_eq!(
            renderer.surface().backing_size(),
            winit::dpi::PhysicalSize::new(150, 30)
        );
    }
}
