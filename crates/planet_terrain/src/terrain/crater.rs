//! Crater stamping.
//!
//! Each crater is a radial bowl around a point on the unit sphere. Inside its
//! radius the profile rises from `-depth` at the center to `0` at the rim and
//! is clamped from below by a flat floor. Overlapping craters add up.

use std::ops::Range;

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{crater_floor, CRATER_DEPTH};

use super::settings::CraterModifiers;

/// A single crater descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Crater {
  /// Center on the unit sphere.
  pub center: DVec3,
  /// Radius in unit-sphere units.
  pub radius: f64,
  /// Exponent of the bowl profile; 1.0 is a parabola in distance.
  pub steepness: f64,
}

impl Crater {
  pub fn new(center: DVec3, radius: f64, steepness: f64) -> Self {
    Self {
      center,
      radius,
      steepness,
    }
  }

  /// Depression at `unit_coords`, in crater units (0 outside the radius).
  #[inline]
  pub fn evaluate(&self, unit_coords: DVec3, modifiers: &CraterModifiers) -> f64 {
    let radius = self.radius * modifiers.radius;
    let r2 = radius * radius;
    let d = unit_coords.distance_squared(self.center);
    if d > r2 || r2 <= 0.0 {
      return 0.0;
    }
    let depth = CRATER_DEPTH * modifiers.depth;
    let steepness = self.steepness * modifiers.steepness;
    let height = depth * (d / r2).powf(steepness) - depth;
    height.max(crater_floor(depth))
  }
}

/// The active crater set of a planet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CraterField {
  pub craters: Vec<Crater>,
}

impl CraterField {
  pub fn new(craters: Vec<Crater>) -> Self {
    Self { craters }
  }

  /// Scatter `count` craters uniformly over the unit sphere.
  pub fn generate(seed: u64, count: usize, radius: Range<f64>, steepness: Range<f64>) -> Self {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let craters = (0..count)
      .map(|_| {
        let z: f64 = rng.random_range(-1.0..=1.0);
        let theta: f64 = rng.random_range(0.0..std::f64::consts::TAU);
        let r = (1.0 - z * z).max(0.0).sqrt();
        let center = DVec3::new(r * theta.cos(), r * theta.sin(), z);
        Crater::new(center, sample(&mut rng, &radius), sample(&mut rng, &steepness))
      })
      .collect();
    Self { craters }
  }

  /// Sum of every crater's depression at `unit_coords`.
  pub fn evaluate(craters: &[Crater], unit_coords: DVec3, modifiers: &CraterModifiers) -> f64 {
    craters
      .iter()
      .map(|crater| crater.evaluate(unit_coords, modifiers))
      .sum()
  }

  pub fn len(&self) -> usize {
    self.craters.len()
  }

  pub fn is_empty(&self) -> bool {
    self.craters.is_empty()
  }
}

// random_range panics on empty ranges
fn sample(rng: &mut ChaCha8Rng, range: &Range<f64>) -> f64 {
  if range.start < range.end {
    rng.random_range(range.clone())
  } else {
    range.start
  }
}
