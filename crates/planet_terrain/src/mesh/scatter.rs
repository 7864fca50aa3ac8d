//! Deterministic instance placement over a chunk's vertices.

use glam::{DVec3, Mat4, Quat, Vec3};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::direction::Direction;
use crate::terrain::ScatterSettings;

/// One vertex candidate: sphere radial, surface normal and origin-relative
/// position.
#[derive(Clone, Copy, Debug)]
pub struct ScatterPoint {
  pub position: Vec3,
  pub radial: Vec3,
  pub normal: Vec3,
}

/// Stable 64-bit key for a chunk placement (splitmix64 over its inputs).
pub fn chunk_key(direction: Direction, depth: u32, center: DVec3) -> u64 {
  let mut h = mix(direction.index() as u64 ^ ((depth as u64) << 8));
  h = mix(h ^ center.x.to_bits());
  h = mix(h ^ center.y.to_bits());
  mix(h ^ center.z.to_bits())
}

#[inline]
fn mix(mut z: u64) -> u64 {
  z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
  z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
  z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
  z ^ (z >> 31)
}

/// Fill `instances` / `aligned_instances` with packed column-major matrices.
///
/// Returns the number of instances placed.
pub fn scatter(
  points: &[ScatterPoint],
  settings: &ScatterSettings,
  depth: u32,
  seed: u64,
  key: u64,
  instances: &mut Vec<f32>,
  aligned_instances: &mut Vec<f32>,
) -> usize {
  if depth < settings.min_depth || settings.density <= 0.0 || settings.max_per_chunk == 0 {
    return 0;
  }

  let density = settings.density.min(1.0);
  let (min_scale, max_scale) = (settings.scale[0], settings.scale[1].max(settings.scale[0]));
  let mut rng = ChaCha8Rng::seed_from_u64(seed ^ key);

  let mut candidates = Vec::new();
  for i in 0..points.len() {
    // Draw all three per point so placement does not depend on the cap
    let roll: f64 = rng.random();
    let yaw: f32 = rng.random_range(0.0..std::f32::consts::TAU);
    let t: f64 = rng.random();
    if roll < density {
      candidates.push((i, yaw, (min_scale + (max_scale - min_scale) * t) as f32));
    }
  }

  // Over the cap: keep a seeded sample spread over the whole chunk
  if candidates.len() > settings.max_per_chunk {
    let mut keep = index::sample(&mut rng, candidates.len(), settings.max_per_chunk).into_vec();
    keep.sort_unstable();
    candidates = keep.into_iter().map(|k| candidates[k]).collect();
  }

  for &(i, yaw, scale) in &candidates {
    let point = &points[i];
    let spin = Quat::from_rotation_y(yaw);
    let radial = Quat::from_rotation_arc(Vec3::Y, point.radial) * spin;
    let aligned = Quat::from_rotation_arc(Vec3::Y, point.normal) * spin;

    instances.extend_from_slice(
      &Mat4::from_scale_rotation_translation(Vec3::splat(scale), radial, point.position)
        .to_cols_array(),
    );
    aligned_instances.extend_from_slice(
      &Mat4::from_scale_rotation_translation(Vec3::splat(scale), aligned, point.position)
        .to_cols_array(),
    );
  }

  candidates.len()
}
