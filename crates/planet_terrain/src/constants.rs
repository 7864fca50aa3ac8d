//! Shape constants for the height field and chunk grids.
//!
//! ```text
//! elevation = crater_term / CRATER_NORMALIZATION
//!           + continents(p) * mountains(p) * DEFAULT_MOUNTAIN_HEIGHT * strength
//!           + bumps(p) * DEFAULT_BUMP_HEIGHT
//!
//! crater profile (d = squared distance to center, r = radius):
//!
//!   0 ┤────────╮                         ╭────────
//!     │         ╲                       ╱
//!     │          ╲                     ╱
//! -3  ┤           ╰───────────────────╯   ← floor = -CRATER_DEPTH * CRATER_FLOOR_RATIO
//!     │
//! -10 ┤  (unclamped bowl bottom = -CRATER_DEPTH)
//! ```

/// Depth of a crater bowl before the floor clamp, in crater units.
pub const CRATER_DEPTH: f64 = 10.0;

/// Fraction of `CRATER_DEPTH` at which the crater floor flattens out.
pub const CRATER_FLOOR_RATIO: f64 = 0.3;

/// Divisor mapping crater units onto noise elevation units.
pub const CRATER_NORMALIZATION: f64 = 20.0;

/// Scale of the continents × mountains product.
pub const DEFAULT_MOUNTAIN_HEIGHT: f64 = 7000.0;

/// Amplitude of the small-scale roughness layer.
pub const DEFAULT_BUMP_HEIGHT: f64 = 500.0;

/// Base frequency of the small-scale roughness layer.
pub const DEFAULT_BUMP_FREQUENCY: f64 = 1e-4;

/// Frequency multiplier between successive noise octaves.
pub const DEFAULT_LACUNARITY: f64 = 2.0;

/// Default chunk grid resolution (quads per row).
pub const DEFAULT_SUBDIVISIONS: u32 = 16;

/// Floats per packed 4x4 instance matrix.
pub const MATRIX_STRIDE: usize = 16;

/// Floats per packed position / normal.
pub const VEC3_STRIDE: usize = 3;

/// Crater floor: `-CRATER_DEPTH * CRATER_FLOOR_RATIO`.
#[inline]
pub fn crater_floor(depth: f64) -> f64 {
  -depth * CRATER_FLOOR_RATIO
}

/// Number of vertices along one row of a chunk grid.
#[inline]
pub const fn vertices_per_row(subdivisions: u32) -> usize {
  subdivisions as usize + 1
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
