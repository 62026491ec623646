//! Read-only primitive buffers bound to storage slots 3 and 4.
//!
//! The contents are opaque to the renderer; only the 4-float record stride
//! the kernel reads with is checked.

use crate::error::SceneError;
use wgpu::util::DeviceExt;

/// Floats per primitive record (`vec4<f32>` in the kernel).
pub const PRIMITIVE_STRIDE: usize = 4;

/// Two spheres as `(cx, cy, cz, radius)`.
pub const DEMO_SPHERES: [f32; 8] = [
    0.0, 0.0, 0.0, 0.5 * 0.5, //
    -0.5, 0.0, 0.25, 0.5 * 0.5,
];

/// Two planes as `(nx, ny, nz, offset)`.
pub const DEMO_PLANES: [f32; 8] = [
    0.0, 1.0, 0.0, 0.0, //
    0.0, -0.5, 0.0, 0.0,
];

/// Checks that `data` is a non-empty array of whole primitive records.
pub fn validate_primitives(name: &'static str, data: &[f32]) -> Result<usize, SceneError> {
    if data.is_empty() {
        return Err(SceneError::Empty { name });
    }
    if data.len() % PRIMITIVE_STRIDE != 0 {
        return Err(SceneError::Stride {
            name,
            len: data.len(),
            stride: PRIMITIVE_STRIDE,
        });
    }
    Ok(data.len() / PRIMITIVE_STRIDE)
}

pub struct SceneBuffers {
    pub spheres: wgpu::Buffer,
    pub planes: wgpu::Buffer,
    pub sphere_count: usize,
    pub plane_count: usize,
}

impl SceneBuffers {
    pub fn new(device: &wgpu::Device, spheres: &[f32], planes: &[f32]) -> Result<Self, SceneError> {
        let sphere_count = validate_primitives("sphere", spheres)?;
        let plane_count = validate_primitives("plane", planes)?;

        let upload = |label: &str, data: &[f32]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE,
            })
        };

        log::debug!("Scene: {} spheres, {} planes", sphere_count, plane_count);

        Ok(Self {
            spheres: upload("Scene Spheres", spheres),
            planes: upload("Scene Planes", planes),
            sphere_count,
            plane_count,
        })
    }

    /// The scene the viewer starts with.
    pub fn demo(device: &wgpu::Device) -> Result<Self, SceneError> {
        Self::new(device, &DEMO_SPHERES, &DEMO_PLANES)
    }
}
