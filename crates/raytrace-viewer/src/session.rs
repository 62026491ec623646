//! Per-session mutable state threaded through each frame tick.

use crate::camera::{CameraController, CameraFrame, InputEvent, Key};

/// Which render target is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Mip-resolved supersampled colour.
    #[default]
    Color,
    /// Raw trace distance from the depth target.
    Depth,
}

impl DisplayMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Color => DisplayMode::Depth,
            DisplayMode::Depth => DisplayMode::Color,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Color => "color",
            DisplayMode::Depth => "depth",
        }
    }
}

/// What the renderer needs from one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUpdate {
    /// A freshly built camera frame, if the pose changed since the last tick.
    pub camera: Option<CameraFrame>,
    pub display: DisplayMode,
}

/// Camera controller plus display mode; the only state input can touch.
#[derive(Debug)]
pub struct SessionState {
    pub controller: CameraController,
    display: DisplayMode,
}

impl SessionState {
    pub fn new(controller: CameraController) -> Self {
        Self {
            controller,
            display: DisplayMode::default(),
        }
    }

    #[inline]
    pub fn display(&self) -> DisplayMode {
        self.display
    }

    /// Routes one input event. The host is expected to drop key-repeat events.
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(Key::ToggleDisplay) => {
                self.display = self.display.toggled();
                log::info!("Display mode: {}", self.display.label());
            }
            other => self.controller.handle_input(other),
        }
    }

    /// Finalises everything the next dispatch will see.
    pub fn tick(&mut self) -> FrameUpdate {
        FrameUpdate {
            camera: self.controller.tick(),
            display: self.display,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraPose, ControllerSettings, Lens};
    use glam::Vec3;

    fn session() -> SessionState {
        let lens = Lens {
            fov_deg: 90.0,
            aspect: 1.0,
            aperture: 0.0,
            focus_distance: 1.0,
        };
        let pose = CameraPose::looking_at(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO).unwrap();
        let controller =
            CameraController::new(pose, lens, ControllerSettings::default()).unwrap();
        SessionState::new(controller)
    }

    #[test]
    fn starts_in_color_mode() {
        assert_eq!(session().display(), DisplayMode::Color);
    }

    #[test]
    fn toggle_twice_restores_mode_and_camera() {
        let mut s = session();
        let frame = *s.controller.frame();

        s.handle_input(InputEvent::KeyDown(Key::ToggleDisplay));
        assert_eq!(s.tick().display, DisplayMode::Depth);
        s.handle_input(InputEvent::KeyUp(Key::ToggleDisplay));
        s.handle_input(InputEvent::KeyDown(Key::ToggleDisplay));

        let update = s.tick();
        assert_eq!(update.display, DisplayMode::Color);
        assert_eq!(update.camera, None);
        assert_eq!(*s.controller.frame(), frame);
    }

    #[test]
    fn idle_ticks_leave_frame_untouched() {
        let mut s = session();
        let initial = s.controller.frame().as_bytes().to_vec();

        for _ in 0..16 {
            s.handle_input(InputEvent::MouseDelta { dx: 0.0, dy: 0.0 });
            assert_eq!(s.tick().camera, None);
        }
        assert_eq!(s.controller.frame().as_bytes(), initial.as_slice());
    }

    #[test]
    fn movement_reaches_controller() {
        let mut s = session();
        s.handle_input(InputEvent::KeyDown(Key::Forward));
        let update = s.tick();

        let frame = update.camera.expect("moved");
        assert!((frame.eye[2] - -4.95).abs() < 1e-5);
    }
}
