use crate::{
    camera::{CameraController, InputEvent, Key},
    config::Settings,
    renderer::Renderer,
    session::SessionState,
    ui::{self, HudStats},
};
use anyhow::Result;
use std::{sync::Arc, time::Instant};
use winit::{
    event::{ElementState, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

/// Maps physical keys to the viewer's logical keys.
pub fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyW => Some(Key::Forward),
        KeyCode::KeyS => Some(Key::Back),
        KeyCode::KeyA => Some(Key::Left),
        KeyCode::KeyD => Some(Key::Right),
        KeyCode::Space => Some(Key::Up),
        KeyCode::ShiftLeft => Some(Key::Down),
        KeyCode::KeyF => Some(Key::ToggleDisplay),
        _ => None,
    }
}

pub struct App {
    pub renderer: Renderer,
    pub session: SessionState,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    last_frame: Instant,
    frame_ms: f32,
}

impl App {
    pub async fn new(window: Arc<Window>, settings: &Settings) -> Result<Self> {
        let controller = CameraController::new(settings.pose, settings.lens, settings.controller)?;
        let renderer = Renderer::new(window.clone(), settings, controller.frame()).await?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            renderer,
            session: SessionState::new(controller),
            egui_ctx,
            egui_state,
            last_frame: Instant::now(),
            frame_ms: 0.0,
        })
    }

    /// Feeds a window event to the HUD and the session. Returns `true` when
    /// the event was fully consumed.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        // The HUD is not interactive; egui only needs to observe the event.
        let _ = self.egui_state.on_window_event(window, event);

        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.repeat {
                return false;
            }
            let PhysicalKey::Code(code) = event.physical_key else {
                return false;
            };
            if let Some(key) = map_key(code) {
                let input = match event.state {
                    ElementState::Pressed => InputEvent::KeyDown(key),
                    ElementState::Released => InputEvent::KeyUp(key),
                };
                self.session.handle_input(input);
                return true;
            }
        }

        false
    }

    /// Raw device motion, independent of cursor position or window bounds.
    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.session.handle_input(InputEvent::MouseDelta {
            dx: dx as f32,
            dy: dy as f32,
        });
    }

    /// One frame tick: finalise input, upload the camera if it moved, then
    /// trace, resolve, draw the HUD and present.
    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let update = self.session.tick();
        if let Some(frame) = &update.camera {
            self.renderer.upload_camera(frame);
        }

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(&swap_view, update.display);

        let now = Instant::now();
        self.frame_ms = now.duration_since(self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;

        let stats = HudStats {
            display: update.display,
            pose: *self.session.controller.pose(),
            grid: self.renderer.grid,
            frame_ms: self.frame_ms,
        };

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);
        ui::draw_hud(&self.egui_ctx, &stats);
        let egui_output = self.egui_ctx.end_frame();
        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_map_to_logical_keys() {
        assert_eq!(map_key(KeyCode::KeyW), Some(Key::Forward));
        assert_eq!(map_key(KeyCode::ShiftLeft), Some(Key::Down));
        assert_eq!(map_key(KeyCode::KeyF), Some(Key::ToggleDisplay));
        assert_eq!(map_key(KeyCode::KeyQ), None);
    }
}
