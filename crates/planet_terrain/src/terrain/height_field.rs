//! Elevation sampling over the sphere.

use glam::DVec3;

use crate::constants::CRATER_NORMALIZATION;
use crate::direction::Direction;

use super::crater::CraterField;
use super::noise_layer::NoiseLayer;
use super::settings::TerrainSettings;

// Independent streams per layer from one planet seed
const CONTINENTS_SALT: u32 = 0x5EED_0001;
const MOUNTAINS_SALT: u32 = 0x5EED_0002;
const BUMPS_SALT: u32 = 0x5EED_0003;

/// Pure elevation function bound to one settings snapshot.
///
/// Points are planet-space (center at the origin). Only their direction
/// matters: every sample is taken at the sea-level point of radius `radius`.
#[derive(Clone, Debug)]
pub struct HeightField<'a> {
  settings: &'a TerrainSettings,
  radius: f64,
  continents: NoiseLayer,
  mountains: NoiseLayer,
  bumps: NoiseLayer,
}

impl<'a> HeightField<'a> {
  pub fn new(settings: &'a TerrainSettings, seed: u64, radius: f64) -> Self {
    let folded = (seed ^ (seed >> 32)) as u32;
    Self {
      settings,
      radius,
      continents: NoiseLayer::new(&settings.continents, &settings.noise, folded ^ CONTINENTS_SALT),
      mountains: NoiseLayer::new(&settings.mountains, &settings.noise, folded ^ MOUNTAINS_SALT),
      bumps: NoiseLayer::new(&settings.bumps, &settings.noise, folded ^ BUMPS_SALT),
    }
  }

  #[inline]
  pub fn radius(&self) -> f64 {
    self.radius
  }

  /// Elevation above sea level in the direction of `p`.
  pub fn elevation(&self, p: DVec3) -> f64 {
    let unit = p.normalize();
    let coords = unit * self.radius;
    let unit_coords = unit * self.settings.noise.frequency;

    let craters = CraterField::evaluate(
      &self.settings.craters,
      unit_coords,
      &self.settings.crater_modifiers,
    );

    let relief = self.continents.evaluate(coords)
      * self.mountains.evaluate(coords)
      * self.settings.mountain_height
      * self.settings.noise.strength;

    let bumps = self.bumps.evaluate(coords) * self.settings.bump_height;

    craters / CRATER_NORMALIZATION + relief + bumps
  }

  /// Elevation under a plane-space point of a face (`z = -L/2` plane).
  pub fn elevation_on_face(&self, direction: Direction, plane_point: DVec3) -> f64 {
    self.elevation(direction.rotation() * plane_point)
  }

  /// Sea-level point pushed out radially by its elevation.
  #[inline]
  pub fn displace(&self, p: DVec3) -> DVec3 {
    let unit = p.normalize();
    unit * (self.radius + self.elevation(unit))
  }

}

#[cfg(test)]
#[path = "height_field_test.rs"]
mod height_field_test;
