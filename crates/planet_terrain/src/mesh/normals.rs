//! Area-weighted vertex normals.

use glam::DVec3;

/// Accumulate every triangle's (unnormalized) face normal onto its three
/// corners, then normalize. Vertices touched by no triangle get `ZERO`.
pub fn vertex_normals(positions: &[DVec3], indices: &[u32]) -> Vec<DVec3> {
  let mut normals = vec![DVec3::ZERO; positions.len()];

  for tri in indices.chunks_exact(3) {
    let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
    let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
    normals[a] += face;
    normals[b] += face;
    normals[c] += face;
  }

  for n in &mut normals {
    *n = n.normalize_or_zero();
  }
  normals
}
