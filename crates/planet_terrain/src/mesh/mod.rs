//! Chunk tessellation: grid → sphere → displaced mesh.
//!
//! ```text
//!  plane grid (z = -L/2)      rotate by face        normalize × R        + elevation
//!  ┌──┬──┬──┐                      │                     │                   │
//!  ├──┼──┼──┤  ───────────────►  cube face  ─────────►  sphere  ─────────►  terrain
//!  └──┴──┴──┘
//! ```
//!
//! Positions are emitted relative to `ChunkMesh::origin` so that the packed
//! `f32` buffers stay precise on planet-sized radii.

pub mod builder;
pub mod normals;
pub mod scatter;

pub use builder::{build, grid_indices};
pub use normals::vertex_normals;

use glam::DVec3;

use crate::constants::{MATRIX_STRIDE, VEC3_STRIDE};

/// Geometry buffers produced for one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
  /// Planet-space position every vertex is relative to (the chunk's
  /// projected center at sea level).
  pub origin: DVec3,

  /// Packed xyz positions relative to `origin`.
  pub positions: Vec<f32>,

  /// Packed xyz unit normals, parallel to `positions`.
  pub normals: Vec<f32>,

  /// Triangle list, counter-clockwise when seen from outside the planet.
  pub indices: Vec<u32>,

  /// Packed column-major 4x4 matrices, up axis along the sphere radial.
  pub instances: Vec<f32>,

  /// Same placements as `instances`, up axis along the surface normal.
  pub aligned_instances: Vec<f32>,

  /// Mean elevation of the chunk's vertices.
  pub average_height: f64,
}

impl ChunkMesh {
  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  pub fn vertex_count(&self) -> usize {
    self.positions.len() / VEC3_STRIDE
  }

  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  pub fn instance_count(&self) -> usize {
    self.instances.len() / MATRIX_STRIDE
  }

  /// Planet-space position of vertex `i`.
  pub fn position(&self, i: usize) -> DVec3 {
    let p = &self.positions[i * VEC3_STRIDE..i * VEC3_STRIDE + 3];
    self.origin + DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64)
  }

  /// Normal of vertex `i`.
  pub fn normal(&self, i: usize) -> DVec3 {
    let n = &self.normals[i * VEC3_STRIDE..i * VEC3_STRIDE + 3];
    DVec3::new(n[0] as f64, n[1] as f64, n[2] as f64)
  }

  /// Approximate heap footprint of the buffers.
  pub fn byte_size(&self) -> usize {
    (self.positions.len() + self.normals.len() + self.instances.len() + self.aligned_instances.len())
      * std::mem::size_of::<f32>()
      + self.indices.len() * std::mem::size_of::<u32>()
  }
}
