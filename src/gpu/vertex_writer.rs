//! Quad vertex byte writer.

use crate::layout::{Span, TextLayout};

use super::pipeline::{VERTEX_STRIDE, VERTICES_PER_QUAD};

/// Reuse an existing GPU buffer if it has enough capacity, otherwise create a new one.
///
/// When `existing` is `Some` and its size >= the data length, writes data
/// into the existing buffer via `queue.write_buffer()` (no allocation).
/// Otherwise creates a fresh buffer.
pub(super) fn reuse_or_create_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    existing: Option<wgpu::Buffer>,
    data: &[u8],
    label: &str,
) -> wgpu::Buffer {
    let needed = (data.len() as u64).max(VERTEX_STRIDE * u64::from(VERTICES_PER_QUAD));
    if let Some(buf) = existing {
        if buf.size() >= needed {
            if !data.is_empty() {
                queue.write_buffer(&buf, 0, data);
            }
            return buf;
        }
    }
    let buf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: needed,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    if !data.is_empty() {
        queue.write_buffer(&buf, 0, data);
    }
    buf
}

/// Writes triangle-list vertices for spans without unsafe code.
pub(super) struct VertexWriter {
    data: Vec<u8>,
}

impl VertexWriter {
    pub(super) fn new() -> Self {
        Self {
            data: Vec::with_capacity(1024),
        }
    }

    /// Two triangles covering a span, in absolute surface pixels.
    pub(super) fn push_span(&mut self, layout: &TextLayout, span: &Span) {
        let [x0, y0, x1, y1] = layout.span_rect(span);
        let [u0, v0, u1, v1] = span.uv;
        for vertex in [
            [x0, y0, u0, v0],
            [x1, y0, u1, v0],
            [x0, y1, u0, v1],
            [x0, y1, u0, v1],
            [x1, y0, u1, v0],
            [x1, y1, u1, v1],
        ] {
            for v in vertex {
                self.data.extend_from_slice(&v.to_ne_bytes());
            }
        }
    }

    pub(super) fn clear(&mut self) {
        self.data.clear();
    }

    pub(super) fn vertex_count(&self) -> u32 {
        (self.data.len() as u64 / VERTEX_STRIDE) as u32
    }

    pub(super) fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
