//! Named failures of the viewer core.
//!
//! Every variant is fatal to the session and is reported once by the binary.

/// Invalid viewport or tile configuration, detected once at startup.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("viewport size must be positive, got {width}x{height}")]
    Viewport { width: u32, height: u32 },

    #[error("supersampling factor must be at least 1, got {0}")]
    Supersampling(u32),

    #[error("tile size must be between 1 and 2^31 per axis, got {x}x{y}")]
    Tile { x: u32, y: u32 },

    #[error("render extent for {width}x{height} at x{supersampling} does not fit in 32 bits")]
    Overflow {
        width: u32,
        height: u32,
        supersampling: u32,
    },

    #[error("render extent {width}x{height} exceeds the device limit of {limit}")]
    Extent { width: u32, height: u32, limit: u32 },

    #[error("tile {x}x{y} exceeds the device compute limits ({reason})")]
    TileLimits { x: u32, y: u32, reason: &'static str },

    #[error("trace bounds must satisfy 0 <= near < far, got ({near}, {far})")]
    TraceBounds { near: f32, far: f32 },

    #[error("--{name} expects three comma-separated components, got {len}")]
    Vector { name: &'static str, len: usize },

    #[error("--{name} is out of range ({range}), got {value}")]
    Lens {
        name: &'static str,
        value: f32,
        range: &'static str,
    },

    #[error(transparent)]
    Camera(#[from] CameraError),
}

/// Camera input that cannot produce an orthonormal basis.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum CameraError {
    #[error("eye and target coincide at {0:?}")]
    DegenerateView([f32; 3]),

    #[error("up vector {0:?} is parallel to the view axis")]
    DegenerateUp([f32; 3]),
}

/// Malformed primitive arrays handed to the scene upload.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("{name} buffer is empty")]
    Empty { name: &'static str },

    #[error("{name} buffer holds {len} floats, not a multiple of {stride}")]
    Stride {
        name: &'static str,
        len: usize,
        stride: usize,
    },
}
