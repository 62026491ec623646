//! The per-frame orchestrator. Owns the GPU context, render targets, scene
//! buffers and every pass, and records them in a fixed order.

pub mod context;
pub mod pipelines;
pub mod targets;

use self::{
    context::GfxContext,
    pipelines::{
        mipmap::MipChain,
        screen::{DepthViewPass, ResolvePass},
        tracer::TracerPipeline,
    },
    targets::Targets,
};
use crate::{
    camera::CameraFrame,
    config::Settings,
    dispatch::DispatchGrid,
    scene::SceneBuffers,
    session::DisplayMode,
};
use anyhow::{anyhow, Context};
use std::sync::Arc;
use winit::window::Window;

/// Owns all rendering-related state.
pub struct Renderer {
    pub gfx: GfxContext,
    pub grid: DispatchGrid,
    pub targets: Targets,
    pub scene: SceneBuffers,
    tracer: TracerPipeline,
    mips: MipChain,
    resolve: ResolvePass,
    depth_view: DepthViewPass,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        settings: &Settings,
        initial_frame: &CameraFrame,
    ) -> anyhow::Result<Self> {
        let grid = DispatchGrid::new(&settings.viewport);
        log::info!(
            "Viewport {}x{} x{} -> render {}x{}, tile {}x{}, groups {}x{}, mip budget {}",
            settings.viewport.width,
            settings.viewport.height,
            settings.viewport.supersampling,
            grid.render.0,
            grid.render.1,
            grid.tile.0,
            grid.tile.1,
            grid.groups.0,
            grid.groups.1,
            grid.mip_levels,
        );

        let gfx = GfxContext::new(window, &settings.viewport, &grid).await?;
        let device = &gfx.device;

        // Kernel or layout mistakes surface here instead of on the first frame.
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let targets = Targets::new(device, &grid);
        let scene = SceneBuffers::demo(device).context("uploading scene buffers")?;
        let tracer = TracerPipeline::new(
            device,
            &grid,
            &settings.trace,
            &targets,
            &scene,
            initial_frame,
        );
        let mips = MipChain::new(device, &targets);
        let resolve = ResolvePass::new(device, gfx.config.format, &targets, &grid);
        let depth_view =
            DepthViewPass::new(device, gfx.config.format, &targets, &grid, &settings.trace);

        if let Some(err) = device.pop_error_scope().await {
            return Err(anyhow!("GPU pipeline creation failed: {}", err));
        }

        let egui_renderer = egui_wgpu::Renderer::new(device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            grid,
            targets,
            scene,
            tracer,
            mips,
            resolve,
            depth_view,
            egui_renderer,
        })
    }

    /// Queues a full replacement of the camera record for the next dispatch.
    pub fn upload_camera(&self, frame: &CameraFrame) {
        self.tracer.upload_camera(&self.gfx.queue, frame);
    }

    /// Records and submits one frame: trace, then either the depth view or
    /// mip generation followed by the colour resolve.
    ///
    /// All passes share one encoder, so the dispatch completes before any
    /// pass that reads its targets.
    pub fn render(&self, swap_view: &wgpu::TextureView, display: DisplayMode) {
        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.tracer.dispatch(&mut encoder);

        match display {
            DisplayMode::Depth => self.depth_view.draw(&mut encoder, swap_view),
            DisplayMode::Color => {
                self.mips.generate(&mut encoder, &self.targets);
                self.resolve.draw(&mut encoder, swap_view);
            }
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}
