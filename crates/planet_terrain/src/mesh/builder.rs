//! Chunk mesh builder.
//!
//! The grid is sampled with a one-vertex skirt on every side. Skirt vertices
//! only feed the normal accumulation, so each edge vertex sees the same
//! neighbourhood as it does from the adjacent chunk of equal depth.
//!
//! ```text
//!   s s s s s        s = skirt (normals only)
//!   s v v v s        v = emitted vertex
//!   s v v v s
//!   s v v v s
//!   s s s s s
//! ```

use glam::{DVec3, Vec3};

use crate::constants::VEC3_STRIDE;
use crate::direction::Direction;
use crate::terrain::{HeightField, TerrainSettings};

use super::normals::vertex_normals;
use super::scatter::{chunk_key, scatter, ScatterPoint};
use super::ChunkMesh;

/// Triangle list for a `vertices_per_row²` grid indexed `x * vertices_per_row + y`.
///
/// Two triangles per cell, counter-clockwise seen from the face's outward
/// normal. The face rotations are proper, so the winding holds on all six
/// faces.
pub fn grid_indices(vertices_per_row: usize) -> Vec<u32> {
  let cells = vertices_per_row.saturating_sub(1);
  let mut indices = Vec::with_capacity(cells * cells * 6);
  for x in 0..cells {
    for y in 0..cells {
      let a = (x * vertices_per_row + y) as u32;
      let b = a + 1;
      let c = ((x + 1) * vertices_per_row + y + 1) as u32;
      let d = ((x + 1) * vertices_per_row + y) as u32;
      indices.extend_from_slice(&[a, b, c, a, c, d]);
    }
  }
  indices
}

/// Build the mesh for one chunk.
///
/// - `center`: chunk center in cube space before the face rotation (the
///   plane-space position with the `-L/2` depth offset applied).
/// - `chunk_length`: side length of this chunk; the planet radius is
///   `chunk_length * 2^depth / 2`.
///
/// # Panics
///
/// If `vertices_per_row < 2` or `chunk_length` is not positive and finite.
#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "mesh::build"))]
pub fn build(
  direction: Direction,
  depth: u32,
  center: DVec3,
  chunk_length: f64,
  vertices_per_row: usize,
  settings: &TerrainSettings,
  seed: u64,
) -> ChunkMesh {
  assert!(
    vertices_per_row >= 2,
    "vertices_per_row must be at least 2, got {}",
    vertices_per_row
  );
  assert!(
    chunk_length.is_finite() && chunk_length > 0.0,
    "chunk_length must be positive, got {}",
    chunk_length
  );

  let radius = chunk_length * (1u64 << depth) as f64 / 2.0;
  let field = HeightField::new(settings, seed, radius);
  let rotation = direction.rotation();
  let subdivisions = (vertices_per_row - 1) as f64;
  let half = subdivisions / 2.0;

  // (vertices_per_row + 2)² grid including the skirt
  let padded = vertices_per_row + 2;
  let mut surface = Vec::with_capacity(padded * padded);
  let mut elevations = Vec::with_capacity(padded * padded);
  for px in 0..padded {
    for py in 0..padded {
      let x = px as f64 - 1.0;
      let y = py as f64 - 1.0;
      let local = DVec3::new((x - half) / subdivisions, (y - half) / subdivisions, 0.0) * chunk_length;
      let unit = (rotation * (local + center)).normalize();
      let elevation = field.elevation(unit);
      surface.push(unit * (radius + elevation));
      elevations.push(elevation);
    }
  }

  let padded_normals = vertex_normals(&surface, &grid_indices(padded));

  let origin = (rotation * center).normalize() * radius;
  let vertex_count = vertices_per_row * vertices_per_row;
  let mut positions = Vec::with_capacity(vertex_count * VEC3_STRIDE);
  let mut normals = Vec::with_capacity(vertex_count * VEC3_STRIDE);
  let mut points = Vec::with_capacity(vertex_count);
  let mut height_sum = 0.0;

  for x in 0..vertices_per_row {
    for y in 0..vertices_per_row {
      let i = (x + 1) * padded + (y + 1);
      let relative = (surface[i] - origin).as_vec3();
      let normal = padded_normals[i].as_vec3();
      positions.extend_from_slice(&relative.to_array());
      normals.extend_from_slice(&normal.to_array());
      height_sum += elevations[i];
      points.push(ScatterPoint {
        position: relative,
        radial: surface[i].normalize().as_vec3(),
        normal: normal.try_normalize().unwrap_or(Vec3::Y),
      });
    }
  }

  let mut instances = Vec::new();
  let mut aligned_instances = Vec::new();
  scatter(
    &points,
    &settings.scatter,
    depth,
    seed,
    chunk_key(direction, depth, center),
    &mut instances,
    &mut aligned_instances,
  );

  ChunkMesh {
    origin,
    positions,
    normals,
    indices: grid_indices(vertices_per_row),
    instances,
    aligned_instances,
    average_height: height_sum / vertex_count as f64,
  }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;
