//! Multi-octave value noise.

use glam::DVec3;
use noise::{NoiseFn, Value};

use super::settings::{NoiseKind, NoiseLayerSettings, NoiseModifiers};

/// A seeded noise layer ready to sample.
#[derive(Clone, Debug)]
pub struct NoiseLayer {
  settings: NoiseLayerSettings,
  noise: Value,
  amplitude: f64,
  min_value: f64,
  offset: DVec3,
}

impl NoiseLayer {
  /// Bind layer settings and global modifiers to a noise seed.
  pub fn new(settings: &NoiseLayerSettings, modifiers: &NoiseModifiers, seed: u32) -> Self {
    Self {
      settings: settings.clone(),
      noise: Value::new(seed),
      amplitude: settings.amplitude * modifiers.amplitude,
      min_value: (settings.min_value * modifiers.min_value).clamp(0.0, 1.0),
      offset: DVec3::from_array(modifiers.offset),
    }
  }

  /// Sample in [0, amplitude].
  pub fn evaluate(&self, p: DVec3) -> f64 {
    let p = p + self.offset;
    let mut total = 0.0;
    let mut norm = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = self.settings.frequency;

    for _ in 0..self.settings.octaves {
      let q = p * frequency;
      let raw = self.noise.get([q.x, q.y, q.z]);
      let sample = match self.settings.kind {
        NoiseKind::Smooth => raw * 0.5 + 0.5,
        NoiseKind::Ridged => 1.0 - raw.abs(),
      };
      total += sample.clamp(0.0, 1.0) * amplitude;
      norm += amplitude;
      amplitude /= self.settings.decay;
      frequency *= self.settings.lacunarity;
    }

    if norm <= 0.0 {
      return 0.0;
    }
    let normalized = total / norm;

    // Flatten everything under min_value, stretch the remainder back to [0, 1]
    let remapped = if self.min_value >= 1.0 {
      0.0
    } else {
      ((normalized - self.min_value) / (1.0 - self.min_value)).max(0.0)
    };

    remapped * self.amplitude
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn layer(settings: NoiseLayerSettings) -> NoiseLayer {
    NoiseLayer::new(&settings, &NoiseModifiers::default(), 7)
  }

  #[test]
  fn output_stays_in_amplitude_range() {
    let l = layer(NoiseLayerSettings {
      amplitude: 3.0,
      frequency: 0.37,
      ..Default::default()
    });
    for i in 0..500 {
      let t = i as f64 * 0.731;
      let v = l.evaluate(DVec3::new(t.sin() * 40.0, t * 0.3, t.cos() * 17.0));
      assert!((0.0..=3.0).contains(&v), "sample {} out of range", v);
    }
  }

  #[test]
  fn same_seed_same_output() {
    let settings = NoiseLayerSettings::ridged(0.1, 4, 2.0, 0.0);
    let a = NoiseLayer::new(&settings, &NoiseModifiers::default(), 3);
    let b = NoiseLayer::new(&settings, &NoiseModifiers::default(), 3);
    let p = DVec3::new(12.5, -3.25, 8.0);
    assert_eq!(a.evaluate(p).to_bits(), b.evaluate(p).to_bits());
  }

  #[test]
  fn min_value_of_one_flattens_layer() {
    let l = layer(NoiseLayerSettings {
      min_value: 1.0,
      frequency: 0.5,
      ..Default::default()
    });
    assert_eq!(l.evaluate(DVec3::new(1.3, 2.7, -0.4)), 0.0);
  }

  #[test]
  fn zero_octaves_is_silent() {
    let l = layer(NoiseLayerSettings {
      octaves: 0,
      ..Default::default()
    });
    assert_eq!(l.evaluate(DVec3::ONE), 0.0);
  }

  #[test]
  fn offset_modifier_shifts_sample_point() {
    let settings = NoiseLayerSettings {
      frequency: 0.25,
      ..Default::default()
    };
    let shifted = NoiseLayer::new(
      &settings,
      &NoiseModifiers {
        offset: [10.0, 0.0, 0.0],
        ..Default::default()
      },
      1,
    );
    let plain = NoiseLayer::new(&settings, &NoiseModifiers::default(), 1);
    let p = DVec3::new(0.3, 1.1, 2.9);
    assert_eq!(
      shifted.evaluate(p).to_bits(),
      plain.evaluate(p + DVec3::new(10.0, 0.0, 0.0)).to_bits()
    );
  }
}
