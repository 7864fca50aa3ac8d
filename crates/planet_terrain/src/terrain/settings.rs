//! Terrain parameter snapshot.
//!
//! A `TerrainSettings` value is captured into every build task. Changing the
//! settings on a planet only affects chunks built afterwards.

use serde::{Deserialize, Serialize};

use crate::constants::{
  DEFAULT_BUMP_FREQUENCY, DEFAULT_BUMP_HEIGHT, DEFAULT_LACUNARITY, DEFAULT_MOUNTAIN_HEIGHT,
};
use crate::error::ConfigError;

use super::crater::Crater;

/// Shape of a single octave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseKind {
  /// Value noise remapped to [0, 1].
  #[default]
  Smooth,
  /// `1 - |noise|`, sharp crests along zero crossings.
  Ridged,
}

/// One multi-octave noise layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayerSettings {
  pub kind: NoiseKind,
  /// Frequency of the first octave, in planet-space units.
  pub frequency: f64,
  pub octaves: u32,
  /// Output scale of the layer.
  pub amplitude: f64,
  /// Each octave's amplitude is the previous one divided by `decay`.
  pub decay: f64,
  /// Each octave's frequency is the previous one multiplied by `lacunarity`.
  pub lacunarity: f64,
  /// Normalized values below this are flattened to zero; the rest are
  /// stretched back over [0, 1].
  pub min_value: f64,
}

impl NoiseLayerSettings {
  pub fn smooth(frequency: f64, octaves: u32, decay: f64, min_value: f64) -> Self {
    Self {
      kind: NoiseKind::Smooth,
      frequency,
      octaves,
      decay,
      min_value,
      ..Default::default()
    }
  }

  pub fn ridged(frequency: f64, octaves: u32, decay: f64, min_value: f64) -> Self {
    Self {
      kind: NoiseKind::Ridged,
      ..Self::smooth(frequency, octaves, decay, min_value)
    }
  }
}

impl Default for NoiseLayerSettings {
  fn default() -> Self {
    Self {
      kind: NoiseKind::Smooth,
      frequency: 1e-5,
      octaves: 5,
      amplitude: 1.0,
      decay: 2.0,
      lacunarity: DEFAULT_LACUNARITY,
      min_value: 0.0,
    }
  }
}

/// Global modifiers applied on top of every noise layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseModifiers {
  /// Multiplies the continents × mountains term.
  pub strength: f64,
  /// Multiplies every layer amplitude.
  pub amplitude: f64,
  /// Scales the unit-sphere coordinates used for crater lookup.
  pub frequency: f64,
  /// Added to the sample point before layer evaluation.
  pub offset: [f64; 3],
  /// Multiplies every layer `min_value`.
  pub min_value: f64,
}

impl Default for NoiseModifiers {
  fn default() -> Self {
    Self {
      strength: 1.0,
      amplitude: 1.0,
      frequency: 1.0,
      offset: [0.0; 3],
      min_value: 1.0,
    }
  }
}

/// Global modifiers applied to every crater.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraterModifiers {
  pub radius: f64,
  pub steepness: f64,
  pub depth: f64,
}

impl Default for CraterModifiers {
  fn default() -> Self {
    Self {
      radius: 1.0,
      steepness: 1.0,
      depth: 1.0,
    }
  }
}

/// Instance placement emitted alongside each chunk mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterSettings {
  /// Expected instances per grid vertex, clamped to [0, 1].
  pub density: f64,
  /// Hard cap per chunk.
  pub max_per_chunk: usize,
  /// Chunks shallower than this emit no instances.
  pub min_depth: u32,
  /// Uniform scale range of each instance.
  pub scale: [f64; 2],
}

impl Default for ScatterSettings {
  fn default() -> Self {
    Self {
      density: 0.0,
      max_per_chunk: 64,
      min_depth: 0,
      scale: [1.0, 1.0],
    }
  }
}

/// Full terrain parameter snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
  pub noise: NoiseModifiers,
  pub crater_modifiers: CraterModifiers,
  pub continents: NoiseLayerSettings,
  pub mountains: NoiseLayerSettings,
  pub bumps: NoiseLayerSettings,
  /// Scale of the continents × mountains product.
  pub mountain_height: f64,
  /// Scale of the bump layer.
  pub bump_height: f64,
  pub craters: Vec<Crater>,
  pub scatter: ScatterSettings,
}

impl Default for TerrainSettings {
  /// Earth-like relief, no craters.
  fn default() -> Self {
    Self {
      noise: NoiseModifiers::default(),
      crater_modifiers: CraterModifiers::default(),
      continents: NoiseLayerSettings::smooth(5e-6, 5, 1.8, 0.5),
      mountains: NoiseLayerSettings::ridged(2e-5, 6, 2.0, 0.0),
      bumps: NoiseLayerSettings::smooth(DEFAULT_BUMP_FREQUENCY, 5, 2.0, 0.0),
      mountain_height: DEFAULT_MOUNTAIN_HEIGHT,
      bump_height: DEFAULT_BUMP_HEIGHT,
      craters: Vec::new(),
      scatter: ScatterSettings::default(),
    }
  }
}

impl TerrainSettings {
  /// Low relief, heavily cratered.
  pub fn barren(seed: u64) -> Self {
    Self {
      noise: NoiseModifiers {
        strength: 0.2,
        ..Default::default()
      },
      craters: super::CraterField::generate(seed, 200, 0.02..0.15, 0.8..2.0).craters,
      ..Default::default()
    }
  }

  /// Flat sphere: no relief, no craters.
  pub fn flat() -> Self {
    Self {
      mountain_height: 0.0,
      bump_height: 0.0,
      ..Default::default()
    }
  }

  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }
}
