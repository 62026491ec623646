//! Builds the colour target's mip chain with one linear-filtered blit per level.

use super::{execute_pass, fullscreen_pipeline, fullscreen_vbo};
use crate::{
    renderer::targets::{Targets, COLOR_FMT},
    shaders::DOWNSAMPLE_WGSL,
};

pub struct MipChain {
    pipeline: wgpu::RenderPipeline,
    /// `bind_groups[i]` samples level `i` and is drawn into level `i + 1`.
    bind_groups: Vec<wgpu::BindGroup>,
    fs_vbo: wgpu::Buffer,
}

impl MipChain {
    pub fn new(device: &wgpu::Device, targets: &Targets) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("MipChain Layout"),
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
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/downsample.wgsl"),
            source: wgpu::ShaderSource::Wgsl(DOWNSAMPLE_WGSL.into()),
        });
        let pipeline = fullscreen_pipeline(device, "MipChain Pipeline", &shader, &layout, COLOR_FMT);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("MipChain Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let sources = targets.color_mips.len().saturating_sub(1);
        let bind_groups = targets.color_mips[..sources]
            .iter()
            .map(|src| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("MipChain Bind"),
                    layout: &layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(src),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                })
            })
            .collect();

        Self {
            pipeline,
            bind_groups,
            fs_vbo: fullscreen_vbo(device, "MipChain FS VBO"),
        }
    }

    /// Downsamples level 0 through the last level, in order. A no-op when the
    /// chain has a single level.
    pub fn generate(&self, encoder: &mut wgpu::CommandEncoder, targets: &Targets) {
        for (bind, dst) in self.bind_groups.iter().zip(&targets.color_mips[1..]) {
            execute_pass(
                &self.pipeline,
                encoder,
                bind,
                &self.fs_vbo,
                dst,
                wgpu::Color::BLACK,
                "MipChain Pass",
            );
        }
    }
}
