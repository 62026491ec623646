//! End-to-end checks of the GPU-free core: sizing, camera frames and input.

use approx::assert_abs_diff_eq;
use clap::Parser;
use glam::Vec3;
use raytrace_viewer::{
    camera::{CameraController, CameraFrame, CameraPose, ControllerSettings, InputEvent, Key, Lens},
    config::Config,
    error::{CameraError, ConfigError},
    dispatch::{next_power_of_two, DispatchGrid, ViewportConfig},
    session::{DisplayMode, SessionState},
};

fn unit_lens() -> Lens {
    Lens {
        fov_deg: 90.0,
        aspect: 1.0,
        aperture: 0.0,
        focus_distance: 1.0,
    }
}

/// Deterministic spread of points without pulling in an RNG.
fn sample_points(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let k = i as f32;
            Vec3::new(
                (k * 1.37).sin() * 10.0,
                (k * 0.73).cos() * 10.0,
                (k * 2.11).sin() * (k * 0.31).cos() * 10.0,
            )
        })
        .collect()
}

#[test]
fn reference_session_grid() {
    let viewport = ViewportConfig::new(720, 720, 2, (32, 32)).unwrap();
    let grid = DispatchGrid::new(&viewport);

    assert_eq!(grid.tile, (32, 32));
    assert_eq!(grid.render, (1440, 1440));
    assert_eq!(grid.groups, (45, 45));
}

#[test]
fn next_power_of_two_properties() {
    for k in 0..32u32 {
        let p = 1u32 << k;
        assert_eq!(next_power_of_two(p), p);
        assert_eq!(next_power_of_two(next_power_of_two(p)), p);
    }
    for x in 1..5000u32 {
        let p = next_power_of_two(x);
        assert!(p.is_power_of_two());
        assert!(p >= x && p / 2 < x);
    }
}

#[test]
fn camera_basis_is_orthonormal() {
    let points = sample_points(64);
    let lens = unit_lens();

    for (i, eye) in points.iter().enumerate() {
        let target = points[(i * 7 + 3) % points.len()];
        let frame = match CameraFrame::build(*eye, target, Vec3::Y, &lens) {
            Ok(frame) => frame,
            Err(_) => continue,
        };
        let (u, v, w) = frame.basis();

        assert!(u.dot(v).abs() < 1e-5);
        assert!(v.dot(w).abs() < 1e-5);
        assert!(w.dot(u).abs() < 1e-5);
        assert_abs_diff_eq!(u.length(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(v.length(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(w.length(), 1.0, epsilon = 1e-5);
        // Right-handed: u x v == w.
        assert_abs_diff_eq!(u.cross(v), w, epsilon = 1e-4);
        assert_eq!(frame.as_bytes().len(), 144);
    }
}

#[test]
fn reference_view_handedness() {
    let frame =
        CameraFrame::build(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, Vec3::Y, &unit_lens()).unwrap();
    assert_eq!(frame.w, [0.0, 0.0, -1.0]);
    assert_eq!(frame.u, [-1.0, 0.0, 0.0]);
    assert_eq!(frame.v, [0.0, 1.0, 0.0]);
}

#[test]
fn idle_session_keeps_camera_bytes() {
    let settings = Config::parse_from(["raytrace_viewer"]).validate().unwrap();
    let controller =
        CameraController::new(settings.pose, settings.lens, settings.controller).unwrap();
    let mut session = SessionState::new(controller);
    let initial = session.controller.frame().as_bytes().to_vec();

    for _ in 0..100 {
        assert!(session.tick().camera.is_none());
    }
    assert_eq!(session.controller.frame().as_bytes(), initial.as_slice());
}

#[test]
fn walk_and_look_then_toggle() {
    let pose = CameraPose::looking_at(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO).unwrap();
    let controller = CameraController::new(pose, unit_lens(), ControllerSettings::default()).unwrap();
    let mut session = SessionState::new(controller);

    session.handle_input(InputEvent::KeyDown(Key::Forward));
    for _ in 0..10 {
        session.tick();
    }
    session.handle_input(InputEvent::KeyUp(Key::Forward));
    assert_abs_diff_eq!(
        session.controller.pose().position,
        Vec3::new(0.0, 0.0, -4.5),
        epsilon = 1e-4
    );

    // Yaw 90 -> 0 turns the view from +Z to +X; w points backwards.
    session.handle_input(InputEvent::MouseDelta { dx: -900.0, dy: 0.0 });
    let frame = session.tick().camera.expect("look changed the frame");
    assert_abs_diff_eq!(Vec3::from(frame.w), Vec3::NEG_X, epsilon = 1e-4);

    session.handle_input(InputEvent::KeyDown(Key::ToggleDisplay));
    session.handle_input(InputEvent::KeyUp(Key::ToggleDisplay));
    assert_eq!(session.tick().display, DisplayMode::Depth);
}

#[test]
fn startup_rejects_eye_on_target() {
    let result = Config::parse_from([
        "raytrace_viewer",
        "--eye",
        "0.5,-1,2",
        "--target",
        "0.5,-1,2",
    ])
    .validate();

    assert_eq!(
        result,
        Err(ConfigError::Camera(CameraError::DegenerateView([0.5, -1.0, 2.0])))
    );
}

#[test]
fn startup_controller_faces_the_target() {
    let settings = Config::parse_from(["raytrace_viewer", "--eye", "3,0,0", "--target", "0,0,0"])
        .validate()
        .unwrap();
    let controller =
        CameraController::new(settings.pose, settings.lens, settings.controller).unwrap();

    // w points from the target back to the eye.
    assert_abs_diff_eq!(Vec3::from(controller.frame().w), Vec3::X, epsilon = 1e-5);
}
