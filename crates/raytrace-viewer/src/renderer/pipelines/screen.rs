//! Display passes: colour resolve through the mip chain, or the raw depth view.

use super::{execute_pass, fullscreen_pipeline, fullscreen_vbo};
use crate::{
    config::TraceBounds,
    dispatch::DispatchGrid,
    renderer::targets::Targets,
    shaders::{self, DEPTH_VIEW_WGSL, RESOLVE_WGSL},
};
use wgpu::util::DeviceExt;

/// Background behind anything the screen passes leave untouched.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 51.0 / 255.0,
    g: 51.0 / 255.0,
    b: 51.0 / 255.0,
    a: 1.0,
};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ScreenParams {
    /// Logical over allocated extent; hides tile padding.
    pub uv_scale: [f32; 2],
    /// Colour mip level sampled by the resolve.
    pub lod: f32,
    pub _pad: f32,
}

const _: [(); 16] = [(); core::mem::size_of::<ScreenParams>()];

impl ScreenParams {
    pub fn new(grid: &DispatchGrid) -> Self {
        Self {
            uv_scale: grid.uv_scale(),
            lod: grid.mip_levels as f32,
            _pad: 0.0,
        }
    }
}

fn params_ubo(device: &wgpu::Device, label: &str, params: &ScreenParams) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(params),
        usage: wgpu::BufferUsages::UNIFORM,
    })
}

fn params_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ScreenParams>() as u64),
        },
        count: None,
    }
}

/// Samples the coarsest mip (native resolution) of the colour target.
pub struct ResolvePass {
    pipeline: wgpu::RenderPipeline,
    bind: wgpu::BindGroup,
    fs_vbo: wgpu::Buffer,
    _ubo: wgpu::Buffer,
}

impl ResolvePass {
    pub fn new(
        device: &wgpu::Device,
        out_fmt: wgpu::TextureFormat,
        targets: &Targets,
        grid: &DispatchGrid,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ResolvePass Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                params_entry(2),
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/resolve.wgsl"),
            source: wgpu::ShaderSource::Wgsl(RESOLVE_WGSL.into()),
        });
        let pipeline = fullscreen_pipeline(device, "ResolvePass Pipeline", &shader, &layout, out_fmt);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ResolvePass Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let ubo = params_ubo(device, "ResolvePass UBO", &ScreenParams::new(grid));

        let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Resolve Bind"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&targets.color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: ubo.as_entire_binding(),
                },
            ],
        });

        Self {
            pipeline,
            bind,
            fs_vbo: fullscreen_vbo(device, "ResolvePass FS VBO"),
            _ubo: ubo,
        }
    }

    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, dst: &wgpu::TextureView) {
        execute_pass(&self.pipeline, encoder, &self.bind, &self.fs_vbo, dst, CLEAR_COLOR, "Resolve Pass");
    }
}

/// Shows trace distance from the depth target as grey levels.
pub struct DepthViewPass {
    pipeline: wgpu::RenderPipeline,
    bind: wgpu::BindGroup,
    fs_vbo: wgpu::Buffer,
    _ubo: wgpu::Buffer,
}

impl DepthViewPass {
    pub fn new(
        device: &wgpu::Device,
        out_fmt: wgpu::TextureFormat,
        targets: &Targets,
        grid: &DispatchGrid,
        trace: &TraceBounds,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("DepthViewPass Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                params_entry(1),
            ],
        });

        let source = shaders::with_defines(DEPTH_VIEW_WGSL, &shaders::depth_view_defines(trace));
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/depth_view.wgsl"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipeline =
            fullscreen_pipeline(device, "DepthViewPass Pipeline", &shader, &layout, out_fmt);

        let ubo = params_ubo(device, "DepthViewPass UBO", &ScreenParams::new(grid));

        let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("DepthView Bind"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&targets.depth),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ubo.as_entire_binding(),
                },
            ],
        });

        Self {
            pipeline,
            bind,
            fs_vbo: fullscreen_vbo(device, "DepthViewPass FS VBO"),
            _ubo: ubo,
        }
    }

    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, dst: &wgpu::TextureView) {
        execute_pass(&self.pipeline, encoder, &self.bind, &self.fs_vbo, dst, CLEAR_COLOR, "DepthView Pass");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ViewportConfig;

    #[test]
    fn resolve_samples_native_resolution_level() {
        let grid = DispatchGrid::new(&ViewportConfig::new(720, 720, 4, (32, 32)).unwrap());
        let params = ScreenParams::new(&grid);
        assert_eq!(params.lod, 2.0);
        assert_eq!(params.uv_scale, [1.0, 1.0]);
        // 2880 / 2^2 == 720
        assert_eq!(grid.render.0 >> params.lod as u32, 720);
    }

    #[test]
    fn padding_is_cropped() {
        let grid = DispatchGrid::new(&ViewportConfig::new(100, 100, 1, (64, 64)).unwrap());
        let params = ScreenParams::new(&grid);
        assert_eq!(params.lod, 0.0);
        assert_eq!(params.uv_scale, [100.0 / 128.0, 100.0 / 128.0]);
    }
}
