//! Headless wgpu device and queue.

use crate::error::RenderError;

/// An adapter's device and queue, shareable between renderers via `Arc`.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Acquire any available adapter without a presentation surface.
    pub fn headless() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| RenderError::Context(format!("no GPU adapter: {e}")))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "gpu: adapter {} ({:?}, {:?})",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.device_type
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("tilefont"),
            required_features: wgpu::Features::empty(),
            // Full adapter texture limits, so HiDPI full-window targets fit.
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            ..Default::default()
        }))
        .map_err(|e| RenderError::Context(format!("failed to create GPU device: {e}")))?;

        Ok(Self {
            device,
            queue,
            adapter_info,
        })
    }
}
