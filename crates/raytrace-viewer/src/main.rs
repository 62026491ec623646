//! Entry point for the ray tracing viewer.

use anyhow::Result;
use clap::Parser;
use raytrace_viewer::{app::App, config::Config};
use std::sync::Arc;
use winit::{
    event::{DeviceEvent, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowBuilder},
};

const TITLE: &str = "RayTracing demo";

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = Config::parse();
    let settings = config.validate().map_err(|err| {
        log::error!("Invalid configuration: {}", err);
        err
    })?;

    // Create the event loop and a fixed-size window.
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                settings.viewport.width,
                settings.viewport.height,
            ))
            .with_resizable(false)
            .build(&event_loop)?,
    );
    grab_cursor(&window);

    // Initialise the application (async → sync).
    let mut app = pollster::block_on(App::new(window.clone(), &settings)).map_err(|err| {
        log::error!("Startup failed: {:#}", err);
        err
    })?;

    // Run the winit event loop.
    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if !app.handle_event(&window, &event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::RedrawRequested => match app.render(&window) {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                app.renderer.gfx.reconfigure();
                            }
                            Err(wgpu::SurfaceError::Timeout) => {
                                log::warn!("Surface timeout – skipping frame.");
                            }
                            Err(e) => {
                                log::error!("Render error: {:?} – exiting.", e);
                                elwt.exit();
                            }
                        },
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                app.handle_mouse_motion(delta.0, delta.1);
            }
            Event::AboutToWait => {
                // Request a redraw each frame.
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}

/// Confines and hides the cursor for mouse-look where the platform allows it.
fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));

    match grabbed {
        Ok(()) => window.set_cursor_visible(false),
        Err(err) => log::warn!("Cursor grab unavailable, mouse-look may stop at the window edge: {}", err),
    }
}
