//! Embedded WGSL sources and build-time constant injection.
//!
//! WGSL has no preprocessor, so build parameters are prepended to a source as
//! module-scope `const` declarations before it is handed to `wgpu`.

use crate::{config::TraceBounds, dispatch::DispatchGrid};
use std::fmt::Write as _;

pub const TRACE_WGSL: &str = include_str!("../shaders/trace.wgsl");
pub const DEPTH_VIEW_WGSL: &str = include_str!("../shaders/depth_view.wgsl");
pub const RESOLVE_WGSL: &str = include_str!("../shaders/resolve.wgsl");
pub const DOWNSAMPLE_WGSL: &str = include_str!("../shaders/downsample.wgsl");

/// A single named build parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Define {
    U32(&'static str, u32),
    F32(&'static str, f32),
}

/// Returns `source` with one `const` line per define in front of it.
pub fn with_defines(source: &str, defines: &[Define]) -> String {
    let mut out = String::with_capacity(source.len() + defines.len() * 32);
    for define in defines {
        // Writing into a String cannot fail.
        let _ = match *define {
            Define::U32(name, value) => writeln!(out, "const {name}: u32 = {value}u;"),
            Define::F32(name, value) => writeln!(out, "const {name}: f32 = {value:?};"),
        };
    }
    out.push_str(source);
    out
}

/// Constants the tracing kernel is compiled with.
pub fn kernel_defines(grid: &DispatchGrid, trace: &TraceBounds) -> [Define; 6] {
    [
        Define::U32("GROUP_X", grid.tile.0),
        Define::U32("GROUP_Y", grid.tile.1),
        Define::U32("VIEW_W", grid.logical.0),
        Define::U32("VIEW_H", grid.logical.1),
        Define::F32("TMIN", trace.tmin),
        Define::F32("TMAX", trace.tmax),
    ]
}

/// Constants the depth display pass is compiled with.
pub fn depth_view_defines(trace: &TraceBounds) -> [Define; 2] {
    [
        Define::F32("TMIN", trace.tmin),
        Define::F32("TMAX", trace.tmax),
    ]
}
