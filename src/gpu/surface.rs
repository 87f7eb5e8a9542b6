//! Offscreen render target sized from a displayed size and device-pixel ratio.

use image::RgbaImage;
use winit::dpi::{LogicalSize, PhysicalSize};

use crate::error::RenderError;

use super::context::GpuContext;
use super::texture::TEXTURE_FORMAT;

pub const MIN_DEVICE_PIXEL_RATIO: f64 = 1.0;
pub const MAX_DEVICE_PIXEL_RATIO: f64 = 2.0;

/// Clamp a device-pixel ratio to the supported range. Non-finite input maps to 1.
pub fn clamp_device_pixel_ratio(dpr: f64) -> f64 {
    if dpr.is_finite() {
        dpr.clamp(MIN_DEVICE_PIXEL_RATIO, MAX_DEVICE_PIXEL_RATIO)
    } else {
        MIN_DEVICE_PIXEL_RATIO
    }
}

/// Backing pixel size: displayed size times the clamped ratio, rounded.
pub fn backing_size(display: LogicalSize<f64>, dpr: f64) -> PhysicalSize<u32> {
    display.to_physical(clamp_device_pixel_ratio(dpr))
}

/// Shrink `size` so neither side exceeds `max_side`, keeping the aspect ratio.
pub fn fit_texture_limit(size: PhysicalSize<u32>, max_side: u32) -> PhysicalSize<u32> {
    let longest = size.width.max(size.height);
    if longest <= max_side {
        return size;
    }
    let shrink = |side: u32| {
        let scaled = u64::from(side) * u64::from(max_side) / u64::from(longest);
        (scaled as u32).max(1)
    };
    PhysicalSize::new(shrink(size.width), shrink(size.height))
}

/// `width * 4` rounded up to the buffer-copy row alignment.
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Drop the per-row padding of a texture-to-buffer copy.
fn strip_row_padding(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row = (width * 4) as usize;
    let mut out = Vec::with_capacity(row * height as usize);
    for chunk in data.chunks(padded_row as usize).take(height as usize) {
        out.extend_from_slice(&chunk[..row]);
    }
    out
}

struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: PhysicalSize<u32>,
}

/// The drawing surface: displayed size, ratio, and the texture behind them.
///
/// The texture is created lazily by the renderer on `init`/`resize`.
pub struct TextSurface {
    display: LogicalSize<f64>,
    device_pixel_ratio: f64,
    target: Option<RenderTarget>,
}

impl TextSurface {
    pub fn new(display: LogicalSize<f64>, device_pixel_ratio: f64) -> Self {
        Self {
            display,
            device_pixel_ratio,
            target: None,
        }
    }

    pub fn display_size(&self) -> LogicalSize<f64> {
        self.display
    }

    pub fn set_display_size(&mut self, display: LogicalSize<f64>) {
        self.display = display;
    }

    /// Ratio as set, before clamping.
    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn set_device_pixel_ratio(&mut self, dpr: f64) {
        self.device_pixel_ratio = dpr;
    }

    /// Size the target would have after the next `configure`.
    pub fn backing_size(&self) -> PhysicalSize<u32> {
        backing_size(self.display, self.device_pixel_ratio)
    }

    /// Size of the current target, if one exists.
    pub fn size(&self) -> Option<PhysicalSize<u32>> {
        self.target.as_ref().map(|t| t.size)
    }

    /// (Re)create the target when the backing size changed.
    ///
    /// Returns true if a new texture was created. A zero displayed or
    /// backing size leaves the current target untouched.
    pub(crate) fn configure(&mut self, device: &wgpu::Device) -> bool {
        if self.display.width <= 0.0 || self.display.height <= 0.0 {
            return false;
        }
        let wanted = self.backing_size();
        let size = fit_texture_limit(wanted, device.limits().max_texture_dimension_2d);
        if size != wanted {
            log::warn!(
                "surface: backing {}x{} exceeds device limit, using {}x{}",
                wanted.width,
                wanted.height,
                size.width,
                size.height
            );
        }
        if size.width == 0 || size.height == 0 || self.size() == Some(size) {
            return false;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("text_surface"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!(
            "surface: backing {}x{} (display {}x{}, dpr {})",
            size.width,
            size.height,
            self.display.width,
            self.display.height,
            self.device_pixel_ratio
        );
        self.target = Some(RenderTarget {
            texture,
            view,
            size,
        });
        true
    }

    pub(crate) fn view(&self) -> Option<&wgpu::TextureView> {
        self.target.as_ref().map(|t| &t.view)
    }

    /// The target texture, for callers compositing it elsewhere.
    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.target.as_ref().map(|t| &t.texture)
    }

    /// Copy the target back to host memory.
    pub(crate) fn read_pixels(&self, gpu: &GpuContext) -> Result<RgbaImage, RenderError> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| RenderError::Readback("surface has no render target".to_owned()))?;
        let PhysicalSize { width, height } = target.size;
        let padded_row = padded_bytes_per_row(width);

        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("surface_readback"),
            size: u64::from(padded_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        gpu.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| RenderError::Readback(format!("device poll failed: {e}")))?;
        rx.recv()
            .map_err(|e| RenderError::Readback(format!("map callback dropped: {e}")))?
            .map_err(|e| RenderError::Readback(format!("buffer mapping failed: {e}")))?;

        let pixels = {
            let data = slice.get_mapped_range();
            strip_row_padding(&data, width, height, padded_row)
        };
        buffer.unmap();

        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::Readback("pixel buffer size mismatch".to_owned()))
    }
}
