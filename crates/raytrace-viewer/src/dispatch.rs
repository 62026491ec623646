//! Maps a viewport and supersampling factor onto a compute dispatch grid.

use crate::error::ConfigError;

/// Session-constant viewport description.
///
/// Build it with [`ViewportConfig::new`], which guarantees every extent
/// [`DispatchGrid::new`] derives from it fits in a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportConfig {
    /// Window size in physical pixels.
    pub width: u32,
    pub height: u32,
    /// Per-axis supersampling multiplier, S >= 1.
    pub supersampling: u32,
    /// Requested compute tile; rounded up to powers of two by [`DispatchGrid`].
    pub tile: (u32, u32),
}

impl ViewportConfig {
    pub fn new(
        width: u32,
        height: u32,
        supersampling: u32,
        tile: (u32, u32),
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::Viewport { width, height });
        }
        if supersampling == 0 {
            return Err(ConfigError::Supersampling(supersampling));
        }

        let (Some(tile_x), Some(tile_y)) = (rounded_tile(tile.0), rounded_tile(tile.1)) else {
            return Err(ConfigError::Tile {
                x: tile.0,
                y: tile.1,
            });
        };

        let fits = padded_extent(width, supersampling, tile_x).is_some()
            && padded_extent(height, supersampling, tile_y).is_some();
        if !fits {
            return Err(ConfigError::Overflow {
                width,
                height,
                supersampling,
            });
        }

        Ok(Self {
            width,
            height,
            supersampling,
            tile,
        })
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Smallest power of two >= `x`. Identity on powers of two; `0` maps to `1`.
///
/// `x` must not exceed `2^31`.
#[inline]
pub fn next_power_of_two(x: u32) -> u32 {
    x.max(1).next_power_of_two()
}

fn rounded_tile(x: u32) -> Option<u32> {
    if x == 0 {
        return None;
    }
    x.checked_next_power_of_two()
}

/// `base * S` rounded up to a whole number of tiles, or `None` on overflow.
fn padded_extent(base: u32, supersampling: u32, tile: u32) -> Option<u32> {
    base.checked_mul(supersampling)?
        .div_ceil(tile)
        .checked_mul(tile)
}

/// Mip levels below the base needed to box-filter `supersampling` back to
/// native resolution: `floor(log2(S))`.
#[inline]
pub fn mip_level_budget(supersampling: u32) -> u32 {
    supersampling.max(1).ilog2()
}

/// Derived compute grid, computed once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchGrid {
    /// Workgroup size, each axis a power of two.
    pub tile: (u32, u32),
    /// Supersampled image the kernel is asked to fill: `(width*S, height*S)`.
    pub logical: (u32, u32),
    /// Allocated render-target extent: `logical` rounded up to whole tiles.
    pub render: (u32, u32),
    /// Workgroup counts, `groups * tile == render` on both axes.
    pub groups: (u32, u32),
    /// Mip chain budget L; the chain holds L + 1 levels.
    pub mip_levels: u32,
}

impl DispatchGrid {
    pub fn new(viewport: &ViewportConfig) -> Self {
        let tile = (
            next_power_of_two(viewport.tile.0),
            next_power_of_two(viewport.tile.1),
        );
        let logical = (
            viewport.width * viewport.supersampling,
            viewport.height * viewport.supersampling,
        );
        let render = (
            logical.0.div_ceil(tile.0) * tile.0,
            logical.1.div_ceil(tile.1) * tile.1,
        );
        let groups = (render.0 / tile.0, render.1 / tile.1);

        Self {
            tile,
            logical,
            render,
            groups,
            mip_levels: mip_level_budget(viewport.supersampling),
        }
    }

    /// Fraction of the render target covered by the logical image. The screen
    /// passes scale their UVs by this so tile padding never reaches the display.
    pub fn uv_scale(&self) -> [f32; 2] {
        [
            self.logical.0 as f32 / self.render.0 as f32,
            self.logical.1 as f32 / self.render.1 as f32,
        ]
    }

    /// Checks the grid against the adapter's compute and texture limits.
    pub fn check_limits(&self, limits: &wgpu::Limits) -> Result<(), ConfigError> {
        let (x, y) = self.tile;
        if x > limits.max_compute_workgroup_size_x {
            return Err(ConfigError::TileLimits { x, y, reason: "workgroup size x" });
        }
        if y > limits.max_compute_workgroup_size_y {
            return Err(ConfigError::TileLimits { x, y, reason: "workgroup size y" });
        }
        if u64::from(x) * u64::from(y) > u64::from(limits.max_compute_invocations_per_workgroup) {
            return Err(ConfigError::TileLimits { x, y, reason: "invocations per workgroup" });
        }
        let groups_limit = limits.max_compute_workgroups_per_dimension;
        if self.groups.0 > groups_limit || self.groups.1 > groups_limit {
            return Err(ConfigError::TileLimits { x, y, reason: "workgroups per dimension" });
        }

        let limit = limits.max_texture_dimension_2d;
        if self.render.0 > limit || self.render.1 > limit {
            return Err(ConfigError::Extent {
                width: self.render.0,
                height: self.render.1,
                limit,
            });
        }
        Ok(())
    }
}
