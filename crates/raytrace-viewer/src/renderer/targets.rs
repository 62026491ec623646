//! Supersampled render targets written by the tracing kernel.

use crate::dispatch::DispatchGrid;

pub const COLOR_FMT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FMT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

pub struct Targets {
    // Private textures – keep alive for the lifetime of the views.
    _color_tex: wgpu::Texture,
    _depth_tex: wgpu::Texture,

    /// One single-level view per colour mip; level 0 doubles as the storage
    /// binding for the kernel.
    pub color_mips: Vec<wgpu::TextureView>,
    /// Whole-chain colour view sampled by the resolve pass.
    pub color: wgpu::TextureView,
    /// Depth is both a storage and a sampled binding; it has a single level.
    pub depth: wgpu::TextureView,

    pub size: wgpu::Extent3d,
}

impl Targets {
    /// Allocates both targets at the grid's render extent. The colour target
    /// carries `grid.mip_levels + 1` levels.
    pub fn new(device: &wgpu::Device, grid: &DispatchGrid) -> Self {
        let size = wgpu::Extent3d {
            width: grid.render.0,
            height: grid.render.1,
            depth_or_array_layers: 1,
        };
        let mip_level_count = grid.mip_levels + 1;

        let color_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Trace Color Target"),
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FMT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let depth_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Trace Depth Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FMT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let color_mips = (0..mip_level_count)
            .map(|level| {
                color_tex.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Trace Color Mip"),
                    base_mip_level: level,
                    mip_level_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        log::info!(
            "Render targets: {}x{} ({} color mip levels)",
            size.width,
            size.height,
            mip_level_count
        );

        Self {
            color_mips,
            color: color_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            depth: depth_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            _color_tex: color_tex,
            _depth_tex: depth_tex,
            size,
        }
    }

    /// Storage view of the full-resolution colour level.
    #[inline]
    pub fn color_storage(&self) -> &wgpu::TextureView {
        &self.color_mips[0]
    }
}
