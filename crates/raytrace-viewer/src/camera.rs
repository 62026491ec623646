use crate::error::CameraError;
use glam::Vec3;
use std::collections::HashSet;

/// Below this length a cross product is treated as zero.
const BASIS_EPSILON: f32 = 1e-6;

/// GPU-resident view description consumed by the tracing kernel at uniform
/// slot 2. Every `vec3` occupies a 16-byte slot; field offsets are part of the
/// kernel contract and must match `Camera` in `shaders/trace.wgsl`.
///
/// | offset | field        |
/// |--------|--------------|
/// | 0      | eye          |
/// | 16     | lower_left   |
/// | 32     | horizontal   |
/// | 48     | vertical     |
/// | 64     | origin       |
/// | 80     | u (right)    |
/// | 96     | v (up)       |
/// | 112    | w (back)     |
/// | 128    | lens_radius  |
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraFrame {
    pub eye: [f32; 3],
    pub _pad0: f32,
    /// Lower-left corner of the image plane at the focus distance.
    pub lower_left: [f32; 3],
    pub _pad1: f32,
    /// Full horizontal span of the image plane.
    pub horizontal: [f32; 3],
    pub _pad2: f32,
    /// Full vertical span of the image plane.
    pub vertical: [f32; 3],
    pub _pad3: f32,
    pub origin: [f32; 3],
    pub _pad4: f32,
    pub u: [f32; 3],
    pub _pad5: f32,
    pub v: [f32; 3],
    pub _pad6: f32,
    pub w: [f32; 3],
    pub _pad7: f32,
    pub lens_radius: f32,
    pub _pad8: [f32; 3],
}

const _: [(); 144] = [(); core::mem::size_of::<CameraFrame>()];

/// Projection and depth-of-field parameters, constant for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    /// Width over height of the logical viewport.
    pub aspect: f32,
    pub aperture: f32,
    pub focus_distance: f32,
}

impl CameraFrame {
    /// Derives the right-handed basis `w = normalize(eye - target)`,
    /// `u = normalize(up x w)`, `v = w x u` and the image plane spanned at
    /// `lens.focus_distance` in front of the eye.
    pub fn build(eye: Vec3, target: Vec3, up: Vec3, lens: &Lens) -> Result<Self, CameraError> {
        let back = eye - target;
        if back.length() < BASIS_EPSILON {
            return Err(CameraError::DegenerateView(eye.to_array()));
        }
        let w = back.normalize();

        let side = up.cross(w);
        if side.length() < BASIS_EPSILON {
            return Err(CameraError::DegenerateUp(up.to_array()));
        }
        let u = side.normalize();
        let v = w.cross(u);

        let half_height = (lens.fov_deg.to_radians() / 2.0).tan();
        let half_width = lens.aspect * half_height;
        let focus = lens.focus_distance;

        let lower_left = eye - half_width * focus * u - half_height * focus * v - focus * w;
        let horizontal = 2.0 * half_width * focus * u;
        let vertical = 2.0 * half_height * focus * v;

        Ok(Self {
            eye: eye.to_array(),
            _pad0: 0.0,
            lower_left: lower_left.to_array(),
            _pad1: 0.0,
            horizontal: horizontal.to_array(),
            _pad2: 0.0,
            vertical: vertical.to_array(),
            _pad3: 0.0,
            origin: eye.to_array(),
            _pad4: 0.0,
            u: u.to_array(),
            _pad5: 0.0,
            v: v.to_array(),
            _pad6: 0.0,
            w: w.to_array(),
            _pad7: 0.0,
            lens_radius: lens.aperture / 2.0,
            _pad8: [0.0; 3],
        })
    }

    /// Exact byte image written to the uniform buffer.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (Vec3::from(self.u), Vec3::from(self.v), Vec3::from(self.w))
    }
}

/// First-person pose: position plus yaw/pitch in degrees.
///
/// Pitch is not clamped; looking past +-90 degrees flips the view upside down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub yaw_deg: f32,
    pub pitch_deg: f32,
}

impl CameraPose {
    /// Pose at `eye` looking towards `target`.
    pub fn looking_at(eye: Vec3, target: Vec3) -> Result<Self, CameraError> {
        let offset = target - eye;
        if offset.length() < BASIS_EPSILON {
            return Err(CameraError::DegenerateView(eye.to_array()));
        }
        let dir = offset.normalize();
        Ok(Self {
            position: eye,
            yaw_deg: dir.z.atan2(dir.x).to_degrees(),
            pitch_deg: dir.y.clamp(-1.0, 1.0).asin().to_degrees(),
        })
    }

    /// `(cos(yaw) cos(pitch), sin(pitch), sin(yaw) cos(pitch))`.
    pub fn direction(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw_deg.to_radians().sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch_deg.to_radians().sin_cos();
        Vec3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch)
    }

    #[inline]
    pub fn target(&self) -> Vec3 {
        self.position + self.direction()
    }

    /// Derivative of [`direction`](Self::direction) with respect to pitch:
    /// the screen-up axis of this pose, defined even when looking straight
    /// up or down.
    pub fn local_up(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw_deg.to_radians().sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch_deg.to_radians().sin_cos();
        Vec3::new(-cos_yaw * sin_pitch, cos_pitch, -sin_yaw * sin_pitch)
    }
}

/// Logical keys understood by the viewer, independent of the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    ToggleDisplay,
}

impl Key {
    /// Movement keys in the order their steps are accumulated.
    pub const MOVEMENT: [Key; 6] = [
        Key::Forward,
        Key::Back,
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
    ];

    #[inline]
    pub fn is_movement(self) -> bool {
        self != Key::ToggleDisplay
    }
}

/// One input sample delivered by the host loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Raw pointer motion in pixels.
    MouseDelta { dx: f32, dy: f32 },
}

/// Tunables for [`CameraController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// World units travelled per tick while a movement key is held.
    pub speed: f32,
    /// Degrees of rotation per pixel of mouse motion.
    pub sensitivity: f32,
    pub world_up: Vec3,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            speed: 0.05,
            sensitivity: 0.1,
            world_up: Vec3::Y,
        }
    }
}

/// Sole owner and mutator of the camera pose.
///
/// Input is accumulated between ticks; [`CameraController::tick`] applies it
/// and rebuilds the frame once, so a dispatch never observes a half-updated
/// pose.
#[derive(Debug, Clone)]
pub struct CameraController {
    pose: CameraPose,
    lens: Lens,
    settings: ControllerSettings,
    held: HashSet<Key>,
    dirty: bool,
    frame: CameraFrame,
}

impl CameraController {
    pub fn new(
        pose: CameraPose,
        lens: Lens,
        settings: ControllerSettings,
    ) -> Result<Self, CameraError> {
        let frame = build_pose_frame(&pose, settings.world_up, &lens)?;
        Ok(Self {
            pose,
            lens,
            settings,
            held: HashSet::new(),
            dirty: false,
            frame,
        })
    }

    #[inline]
    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    /// The frame most recently produced (and uploaded) for this pose.
    #[inline]
    pub fn frame(&self) -> &CameraFrame {
        &self.frame
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Records one input event. Non-movement keys are ignored here.
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) if key.is_movement() => {
                self.held.insert(key);
            }
            InputEvent::KeyUp(key) if key.is_movement() => {
                self.held.remove(&key);
            }
            InputEvent::MouseDelta { dx, dy } => {
                if dx != 0.0 || dy != 0.0 {
                    self.pose.yaw_deg += dx * self.settings.sensitivity;
                    self.pose.pitch_deg -= dy * self.settings.sensitivity;
                    self.dirty = true;
                }
            }
            _ => {}
        }
    }

    /// Advances one frame: moves by a fixed step for each held key and, if
    /// the pose changed, returns the rebuilt frame to upload.
    ///
    /// The step does not scale with elapsed time, so motion speed follows the
    /// display refresh rate.
    pub fn tick(&mut self) -> Option<CameraFrame> {
        let step = self.movement_step();
        if step != Vec3::ZERO {
            self.pose.position += step;
            self.dirty = true;
        }

        if !self.dirty {
            return None;
        }
        self.dirty = false;

        match build_pose_frame(&self.pose, self.settings.world_up, &self.lens) {
            Ok(frame) => {
                self.frame = frame;
                Some(frame)
            }
            Err(err) => {
                log::warn!("Keeping previous camera frame: {}", err);
                None
            }
        }
    }

    fn movement_step(&self) -> Vec3 {
        let forward = self.pose.direction();
        let up = self.settings.world_up;
        let right = forward.cross(up).normalize_or_zero();

        Key::MOVEMENT
            .iter()
            .filter(|key| self.held.contains(*key))
            .map(|key| match key {
                Key::Forward => forward,
                Key::Back => -forward,
                Key::Right => right,
                Key::Left => -right,
                Key::Up => up,
                Key::Down => -up,
                Key::ToggleDisplay => Vec3::ZERO,
            })
            .fold(Vec3::ZERO, |acc, axis| acc + axis * self.settings.speed)
    }
}

/// Frame for `pose` against `world_up`. When the view axis is parallel to
/// `world_up` (pitch at +-90 degrees) the pose's own up axis is used instead.
fn build_pose_frame(pose: &CameraPose, world_up: Vec3, lens: &Lens) -> Result<CameraFrame, CameraError> {
    match CameraFrame::build(pose.position, pose.target(), world_up, lens) {
        Err(CameraError::DegenerateUp(_)) => {
            CameraFrame::build(pose.position, pose.target(), pose.local_up(), lens)
        }
        built => built,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EPS: f32 = 1e-5;

    fn lens() -> Lens {
        Lens {
            fov_deg: 90.0,
            aspect: 1.0,
            aperture: 0.0,
            focus_distance: 1.0,
        }
    }

    fn controller() -> CameraController {
        let pose = CameraPose {
            position: Vec3::ZERO,
            yaw_deg: 0.0,
            pitch_deg: 0.0,
        };
        CameraController::new(pose, lens(), ControllerSettings::default()).unwrap()
    }

    #[test]
    fn reference_view_basis() {
        let frame =
            CameraFrame::build(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, Vec3::Y, &lens()).unwrap();

        let (u, v, w) = frame.basis();
        assert_abs_diff_eq!(w, Vec3::new(0.0, 0.0, -1.0), epsilon = EPS);
        assert_abs_diff_eq!(u, Vec3::new(-1.0, 0.0, 0.0), epsilon = EPS);
        assert_abs_diff_eq!(v, Vec3::new(0.0, 1.0, 0.0), epsilon = EPS);

        // 90 degree fov at unit focus: the plane spans [-1, 1] on both axes, one unit ahead.
        assert_abs_diff_eq!(Vec3::from(frame.horizontal), Vec3::new(-2.0, 0.0, 0.0), epsilon = EPS);
        assert_abs_diff_eq!(Vec3::from(frame.vertical), Vec3::new(0.0, 2.0, 0.0), epsilon = EPS);
        assert_abs_diff_eq!(Vec3::from(frame.lower_left), Vec3::new(1.0, -1.0, -4.0), epsilon = EPS);
        assert_eq!(frame.origin, frame.eye);
    }

    #[test]
    fn lens_radius_is_half_aperture() {
        let lens = Lens {
            aperture: 0.5,
            focus_distance: 3.0,
            ..lens()
        };
        let frame = CameraFrame::build(Vec3::Z, Vec3::ZERO, Vec3::Y, &lens).unwrap();
        assert_eq!(frame.lens_radius, 0.25);

        // Image plane centre sits `focus_distance` along -w.
        let centre = Vec3::from(frame.lower_left)
            + 0.5 * Vec3::from(frame.horizontal)
            + 0.5 * Vec3::from(frame.vertical);
        assert_abs_diff_eq!(centre, Vec3::new(0.0, 0.0, -2.0), epsilon = EPS);
    }

    #[test]
    fn padding_is_zeroed_and_stride_fixed() {
        let frame = CameraFrame::build(Vec3::ONE, Vec3::ZERO, Vec3::Y, &lens()).unwrap();
        assert_eq!(frame.as_bytes().len(), 144);
        assert_eq!(std::mem::offset_of!(CameraFrame, lower_left), 16);
        assert_eq!(std::mem::offset_of!(CameraFrame, u), 80);
        assert_eq!(std::mem::offset_of!(CameraFrame, lens_radius), 128);
        assert_eq!(frame._pad3, 0.0);
        assert_eq!(frame._pad8, [0.0; 3]);
    }

    #[test]
    fn coincident_eye_and_target_fail() {
        let err = CameraFrame::build(Vec3::ONE, Vec3::ONE, Vec3::Y, &lens()).unwrap_err();
        assert_eq!(err, CameraError::DegenerateView([1.0, 1.0, 1.0]));
    }

    #[test]
    fn up_parallel_to_view_fails() {
        let err = CameraFrame::build(Vec3::Y, Vec3::ZERO, Vec3::Y, &lens()).unwrap_err();
        assert!(matches!(err, CameraError::DegenerateUp(_)));
    }

    #[test]
    fn pose_direction_matches_angles() {
        let mut pose = CameraPose {
            position: Vec3::ZERO,
            yaw_deg: 0.0,
            pitch_deg: 0.0,
        };
        assert_abs_diff_eq!(pose.direction(), Vec3::X, epsilon = EPS);

        pose.yaw_deg = 90.0;
        assert_abs_diff_eq!(pose.direction(), Vec3::Z, epsilon = EPS);

        pose.pitch_deg = 90.0;
        assert_abs_diff_eq!(pose.direction(), Vec3::Y, epsilon = EPS);
    }

    #[test]
    fn looking_at_recovers_angles() {
        let pose = CameraPose::looking_at(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO).unwrap();
        assert_abs_diff_eq!(pose.yaw_deg, 90.0, epsilon = 1e-4);
        assert_abs_diff_eq!(pose.pitch_deg, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(pose.direction(), Vec3::Z, epsilon = EPS);
    }

    #[test]
    fn looking_at_own_position_fails() {
        let eye = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(
            CameraPose::looking_at(eye, eye),
            Err(CameraError::DegenerateView([1.0, 2.0, 3.0]))
        );
    }

    #[test]
    fn vertical_view_uses_pose_up_axis() {
        let pose = CameraPose {
            position: Vec3::ZERO,
            yaw_deg: 90.0,
            pitch_deg: 90.0,
        };
        let mut ctl = CameraController::new(pose, lens(), ControllerSettings::default()).unwrap();

        let (u, v, w) = ctl.frame().basis();
        assert_abs_diff_eq!(w, Vec3::NEG_Y, epsilon = 1e-4);
        // Looking up from facing +Z, the top of the image points back along -Z.
        assert_abs_diff_eq!(v, Vec3::NEG_Z, epsilon = 1e-4);
        assert_abs_diff_eq!(u.cross(v), w, epsilon = 1e-4);

        // Movement keeps producing frames while the pitch stays vertical.
        ctl.handle_input(InputEvent::KeyDown(Key::Up));
        for _ in 0..3 {
            assert!(ctl.tick().is_some());
        }
        assert_abs_diff_eq!(Vec3::from(ctl.frame().eye), Vec3::new(0.0, 0.15, 0.0), epsilon = EPS);
    }

    #[test]
    fn mouse_delta_turns_by_sensitivity() {
        let mut ctl = controller();
        let sensitivity = ControllerSettings::default().sensitivity;

        ctl.handle_input(InputEvent::MouseDelta {
            dx: 180.0 / sensitivity,
            dy: 0.0,
        });
        let frame = ctl.tick().expect("pose changed");

        assert_abs_diff_eq!(ctl.pose().yaw_deg, 180.0, epsilon = 1e-3);
        assert_abs_diff_eq!(ctl.pose().direction(), Vec3::NEG_X, epsilon = 1e-4);
        // w points back, away from the new view direction.
        assert_abs_diff_eq!(Vec3::from(frame.w), Vec3::X, epsilon = 1e-4);
    }

    #[test]
    fn mouse_down_motion_lowers_pitch_without_clamping() {
        let mut ctl = controller();
        ctl.handle_input(InputEvent::MouseDelta { dx: 0.0, dy: 2000.0 });
        ctl.tick();
        assert_abs_diff_eq!(ctl.pose().pitch_deg, -200.0, epsilon = 1e-3);
    }

    #[test]
    fn held_key_moves_fixed_step_each_tick() {
        let mut ctl = controller();
        ctl.handle_input(InputEvent::KeyDown(Key::Forward));

        for _ in 0..4 {
            assert!(ctl.tick().is_some());
        }
        assert_abs_diff_eq!(ctl.pose().position, Vec3::new(0.2, 0.0, 0.0), epsilon = EPS);

        ctl.handle_input(InputEvent::KeyUp(Key::Forward));
        assert!(ctl.tick().is_none());
        assert!(!ctl.is_held(Key::Forward));
    }

    #[test]
    fn strafe_and_vertical_axes() {
        let mut ctl = controller();
        ctl.handle_input(InputEvent::KeyDown(Key::Right));
        ctl.handle_input(InputEvent::KeyDown(Key::Up));
        ctl.tick();
        // Looking down +X with +Y up, right is +Z.
        assert_abs_diff_eq!(ctl.pose().position, Vec3::new(0.0, 0.05, 0.05), epsilon = EPS);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut ctl = controller();
        ctl.handle_input(InputEvent::KeyDown(Key::Left));
        ctl.handle_input(InputEvent::KeyDown(Key::Right));
        assert!(ctl.tick().is_none());
        assert_eq!(ctl.pose().position, Vec3::ZERO);
    }

    #[test]
    fn degenerate_pitch_keeps_previous_frame() {
        let mut ctl = controller();
        let before = *ctl.frame();
        ctl.handle_input(InputEvent::MouseDelta { dx: 0.0, dy: -900.0 });

        assert!(ctl.tick().is_none());
        assert_eq!(*ctl.frame(), before);
        assert_abs_diff_eq!(ctl.pose().pitch_deg, 90.0, epsilon = 1e-4);
    }

    #[test]
    fn toggle_key_is_not_held() {
        let mut ctl = controller();
        ctl.handle_input(InputEvent::KeyDown(Key::ToggleDisplay));
        assert!(!ctl.is_held(Key::ToggleDisplay));
        assert!(ctl.tick().is_none());
    }
}
