use crate::dispatch::{DispatchGrid, ViewportConfig};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use winit::window::Window;

/// Holds all GPU resources needed for rendering.
pub struct GfxContext {
    pub surface: wgpu::Surface<'static>,
    pub device:  wgpu::Device,
    pub queue:   wgpu::Queue,
    pub config:  wgpu::SurfaceConfiguration,
    pub adapter_name: String,
}

impl GfxContext {
    /// Creates a new graphics context bound to the given window. The surface
    /// is sized to the viewport, not to whatever the platform reports.
    pub async fn new(
        window: Arc<Window>,
        viewport: &ViewportConfig,
        grid: &DispatchGrid,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

        // The surface must outlive the window; `Arc` guarantees this.
        let surface = instance.create_surface(window)?;

        // Choose a high‑performance adapter compatible with the surface.
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference:         wgpu::PowerPreference::HighPerformance,
                compatible_surface:       Some(&surface),
                force_fallback_adapter:   false,
            })
            .await
            .ok_or_else(|| anyhow!("Failed to find a suitable GPU adapter."))?;

        let adapter_name = adapter.get_info().name;
        grid.check_limits(&adapter.limits())?;

        // Default limits, raised just enough for the tile and render extent.
        let defaults = wgpu::Limits::default();
        let required_limits = wgpu::Limits {
            max_compute_workgroup_size_x: defaults.max_compute_workgroup_size_x.max(grid.tile.0),
            max_compute_workgroup_size_y: defaults.max_compute_workgroup_size_y.max(grid.tile.1),
            max_compute_invocations_per_workgroup: defaults
                .max_compute_invocations_per_workgroup
                .max(grid.tile.0 * grid.tile.1),
            max_texture_dimension_2d: defaults
                .max_texture_dimension_2d
                .max(grid.render.0.max(grid.render.1)),
            ..defaults
        };

        // Request a device and its command queue.
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label:             Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                },
                None, // no trace
            )
            .await?;

        // Determine the surface format (prefer sRGB).
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats."))?;

        // Configure the surface.
        let config = wgpu::SurfaceConfiguration {
            usage:                       wgpu::TextureUsages::RENDER_ATTACHMENT,
            format:                      surface_format,
            width:                       viewport.width,
            height:                      viewport.height,
            present_mode:                wgpu::PresentMode::Fifo, // V‑sync
            alpha_mode:                  caps.alpha_modes[0],
            view_formats:                vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        log::info!("GPU adapter: {} ({:?})", adapter_name, surface_format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            adapter_name,
        })
    }

    /// Re-applies the (fixed) surface configuration after the swapchain was
    /// lost or became outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}
