//! The compute pass: binds camera, scene and both targets, then dispatches
//! one workgroup per tile.

use crate::{
    camera::CameraFrame,
    config::TraceBounds,
    dispatch::DispatchGrid,
    renderer::targets::{Targets, COLOR_FMT, DEPTH_FMT},
    scene::SceneBuffers,
    shaders::{self, TRACE_WGSL},
};
use wgpu::util::DeviceExt;

/// Binding slots shared with `shaders/trace.wgsl`.
pub mod slot {
    pub const COLOR: u32 = 0;
    pub const DEPTH: u32 = 1;
    pub const CAMERA: u32 = 2;
    pub const SPHERES: u32 = 3;
    pub const PLANES: u32 = 4;
}

pub struct TracerPipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    camera_ubo: wgpu::Buffer,
    groups: (u32, u32),
}

impl TracerPipeline {
    pub fn new(
        device: &wgpu::Device,
        grid: &DispatchGrid,
        trace: &TraceBounds,
        targets: &Targets,
        scene: &SceneBuffers,
        initial_frame: &CameraFrame,
    ) -> Self {
        let storage_image = |binding, format| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        };
        let primitives = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Tracer Layout"),
            entries: &[
                storage_image(slot::COLOR, COLOR_FMT),
                storage_image(slot::DEPTH, DEPTH_FMT),
                wgpu::BindGroupLayoutEntry {
                    binding: slot::CAMERA,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<CameraFrame>() as u64,
                        ),
                    },
                    count: None,
                },
                primitives(slot::SPHERES),
                primitives(slot::PLANES),
            ],
        });

        let camera_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Frame UBO"),
            contents: initial_frame.as_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Tracer Bind"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: slot::COLOR,
                    resource: wgpu::BindingResource::TextureView(targets.color_storage()),
                },
                wgpu::BindGroupEntry {
                    binding: slot::DEPTH,
                    resource: wgpu::BindingResource::TextureView(&targets.depth),
                },
                wgpu::BindGroupEntry {
                    binding: slot::CAMERA,
                    resource: camera_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: slot::SPHERES,
                    resource: scene.spheres.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: slot::PLANES,
                    resource: scene.planes.as_entire_binding(),
                },
            ],
        });

        let source = shaders::with_defines(TRACE_WGSL, &shaders::kernel_defines(grid, trace));
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/trace.wgsl"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipe_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Tracer PipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Tracer Pipeline"),
            layout: Some(&pipe_layout),
            module: &shader,
            entry_point: "main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        });

        Self {
            pipeline,
            bind_group,
            camera_ubo,
            groups: grid.groups,
        }
    }

    /// Replaces the whole camera record in one write; it lands before the
    /// next submitted dispatch.
    pub fn upload_camera(&self, queue: &wgpu::Queue, frame: &CameraFrame) {
        queue.write_buffer(&self.camera_ubo, 0, frame.as_bytes());
    }

    pub fn dispatch(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Trace Pass"),
            timestamp_writes: None,
        });

        cpass.set_pipeline(&self.pipeline);
        cpass.set_bind_group(0, &self.bind_group, &[]);
        cpass.dispatch_workgroups(self.groups.0, self.groups.1, 1);
    }
}
