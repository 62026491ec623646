use crate::{
    camera::{CameraPose, ControllerSettings, Lens},
    dispatch::ViewportConfig,
    error::ConfigError,
};
use clap::Parser;
use glam::Vec3;

/// `raytrace_viewer` - real-time GPU ray tracing of a small analytic scene.
///
/// A compute kernel traces every pixel of a supersampled colour and depth
/// target; the colour target is resolved to the window through its mip chain.
/// W/A/S/D/Space/Shift move, the mouse looks around, F toggles the depth view.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Window width in pixels. The window is not resizable.
    #[arg(long, env = "RT_WIDTH", default_value_t = 720)]
    pub width: u32,

    /// Window height in pixels.
    #[arg(long, env = "RT_HEIGHT", default_value_t = 720)]
    pub height: u32,

    /// Per-axis supersampling factor applied before tracing.
    #[arg(long, env = "RT_SUPERSAMPLING", default_value_t = 2)]
    pub supersampling: u32,

    /// Requested compute tile width; rounded up to a power of two.
    #[arg(long, env = "RT_TILE_X", default_value_t = 32)]
    pub tile_x: u32,

    /// Requested compute tile height; rounded up to a power of two.
    #[arg(long, env = "RT_TILE_Y", default_value_t = 32)]
    pub tile_y: u32,

    /// Nearest trace distance handed to the kernel.
    #[arg(long, env = "RT_TMIN", default_value_t = 0.0)]
    pub tmin: f32,

    /// Farthest trace distance handed to the kernel.
    #[arg(long, env = "RT_TMAX", default_value_t = 65536.0)]
    pub tmax: f32,

    /// Initial eye position, `x,y,z`.
    #[arg(
        long,
        env = "RT_EYE",
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [0.0, 0.0, -5.0]
    )]
    pub eye: Vec<f32>,

    /// Initial look-at point, `x,y,z`.
    #[arg(
        long,
        env = "RT_TARGET",
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [0.0, 0.0, 0.0]
    )]
    pub target: Vec<f32>,

    /// Vertical field of view in degrees.
    #[arg(long, env = "RT_FOV", default_value_t = 90.0)]
    pub fov: f32,

    /// Lens aperture; 0 disables depth of field.
    #[arg(long, env = "RT_APERTURE", default_value_t = 0.0)]
    pub aperture: f32,

    /// Distance to the plane of perfect focus.
    #[arg(long, env = "RT_FOCUS_DISTANCE", default_value_t = 1.0)]
    pub focus_distance: f32,

    /// World units moved per rendered frame while a movement key is held.
    #[arg(long, env = "RT_SPEED", default_value_t = 0.05)]
    pub speed: f32,

    /// Degrees of rotation per pixel of mouse motion.
    #[arg(long, env = "RT_SENSITIVITY", default_value_t = 0.1)]
    pub sensitivity: f32,
}

/// Near/far distances injected into the kernel and the depth view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceBounds {
    pub tmin: f32,
    pub tmax: f32,
}

/// Validated, session-constant settings derived from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub viewport: ViewportConfig,
    pub trace: TraceBounds,
    pub lens: Lens,
    pub pose: CameraPose,
    pub controller: ControllerSettings,
}

impl Config {
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let viewport = ViewportConfig::new(
            self.width,
            self.height,
            self.supersampling,
            (self.tile_x, self.tile_y),
        )?;

        if !(self.tmin >= 0.0 && self.tmin < self.tmax && self.tmax.is_finite()) {
            return Err(ConfigError::TraceBounds {
                near: self.tmin,
                far: self.tmax,
            });
        }

        let eye = vec3_arg("eye", &self.eye)?;
        let target = vec3_arg("target", &self.target)?;
        let pose = CameraPose::looking_at(eye, target)?;

        lens_arg("fov", self.fov, "0 < fov < 180", |v| v > 0.0 && v < 180.0)?;
        lens_arg("aperture", self.aperture, ">= 0", |v| v >= 0.0)?;
        lens_arg("focus-distance", self.focus_distance, "> 0", |v| v > 0.0)?;

        Ok(Settings {
            viewport,
            trace: TraceBounds {
                tmin: self.tmin,
                tmax: self.tmax,
            },
            lens: Lens {
                fov_deg: self.fov,
                aspect: viewport.aspect(),
                aperture: self.aperture,
                focus_distance: self.focus_distance,
            },
            pose,
            controller: ControllerSettings {
                speed: self.speed,
                sensitivity: self.sensitivity,
                ..ControllerSettings::default()
            },
        })
    }
}

fn vec3_arg(name: &'static str, values: &[f32]) -> Result<Vec3, ConfigError> {
    match values {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(ConfigError::Vector {
            name,
            len: values.len(),
        }),
    }
}

fn lens_arg(
    name: &'static str,
    value: f32,
    range: &'static str,
    accepts: impl Fn(f32) -> bool,
) -> Result<(), ConfigError> {
    if value.is_finite() && accepts(value) {
        Ok(())
    } else {
        Err(ConfigError::Lens { name, value, range })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CameraError;

    #[test]
    fn defaults_match_reference_session() {
        let settings = Config::parse_from(["raytrace_viewer"]).validate().unwrap();

        assert_eq!(settings.viewport.width, 720);
        assert_eq!(settings.viewport.height, 720);
        assert_eq!(settings.viewport.supersampling, 2);
        assert_eq!(settings.viewport.tile, (32, 32));
        assert_eq!(settings.trace, TraceBounds { tmin: 0.0, tmax: 65536.0 });
        assert_eq!(settings.pose.position, Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(settings.lens.aspect, 1.0);
    }

    #[test]
    fn parses_negative_vectors() {
        let config = Config::parse_from(["raytrace_viewer", "--eye", "-1,2,-3", "--width", "640"]);
        let settings = config.validate().unwrap();
        assert_eq!(settings.pose.position, Vec3::new(-1.0, 2.0, -3.0));
        assert_eq!(settings.lens.aspect, 640.0 / 720.0);
    }

    #[test]
    fn rejects_zero_supersampling() {
        let config = Config::parse_from(["raytrace_viewer", "--supersampling", "0"]);
        assert_eq!(config.validate(), Err(ConfigError::Supersampling(0)));
    }

    #[test]
    fn rejects_inverted_trace_bounds() {
        let config = Config::parse_from(["raytrace_viewer", "--tmin", "10", "--tmax", "1"]);
        assert!(matches!(config.validate(), Err(ConfigError::TraceBounds { .. })));

        let config = Config::parse_from(["raytrace_viewer", "--tmax", "inf"]);
        assert!(matches!(config.validate(), Err(ConfigError::TraceBounds { .. })));
    }

    #[test]
    fn rejects_eye_on_target() {
        let config = Config::parse_from(["raytrace_viewer", "--eye", "1,2,3", "--target", "1,2,3"]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Camera(CameraError::DegenerateView([1.0, 2.0, 3.0])))
        );
    }

    #[test]
    fn rejects_collapsed_lens() {
        let cases: [&[&str]; 4] = [
            &["--fov", "0"],
            &["--fov", "180"],
            &["--focus-distance", "0"],
            &["--aperture=-1"],
        ];
        for args in cases {
            let config =
                Config::parse_from(std::iter::once("raytrace_viewer").chain(args.iter().copied()));
            assert!(
                matches!(config.validate(), Err(ConfigError::Lens { .. })),
                "{args:?} was accepted"
            );
        }
    }

    #[test]
    fn rejects_short_vectors() {
        let config = Config::parse_from(["raytrace_viewer", "--target", "1,2"]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Vector { name: "target", len: 2 })
        );
    }
}
