//! Construction-time configuration for planets and the chunk forge.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SUBDIVISIONS;
use crate::error::ConfigError;
use crate::quadtree::QuadtreePath;

/// Quadtree and chunk geometry settings shared by the six sides of a planet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetConfig {
  /// Shallowest depth any leaf may sit at.
  pub min_depth: u32,

  /// Deepest depth a leaf may be split to.
  pub max_depth: u32,

  /// Side length of a root face. The planet radius is half of this.
  pub chunk_length: f64,

  /// Quads per chunk row (vertices per row - 1).
  pub base_subdivisions: u32,

  /// Split distance, in units of the node's side length.
  /// limit = render_distance_factor * chunk_length / 2^depth
  pub render_distance_factor: f64,

  /// Merge only once the observer is `limit * merge_hysteresis` away.
  /// 1.0 uses a single threshold for both split and merge.
  pub merge_hysteresis: f64,

  /// Keep replaced, already-applied chunks until their replacements are
  /// applied.
  pub deferred_deletion: bool,

  /// Seed forwarded to every chunk build.
  pub seed: u64,
}

impl PlanetConfig {
  /// Planet radius before displacement.
  #[inline]
  pub fn radius(&self) -> f64 {
    self.chunk_length / 2.0
  }

  /// Vertices along one chunk row.
  #[inline]
  pub fn vertices_per_row(&self) -> usize {
    self.base_subdivisions as usize + 1
  }

  /// Side length of a node at `depth`.
  #[inline]
  pub fn node_length(&self, depth: u32) -> f64 {
    self.chunk_length / (1u64 << depth) as f64
  }

  /// Split threshold for nodes at `depth`.
  #[inline]
  pub fn split_limit(&self, depth: u32) -> f64 {
    self.render_distance_factor * self.node_length(depth)
  }

  /// Merge threshold for nodes at `depth`.
  #[inline]
  pub fn merge_limit(&self, depth: u32) -> f64 {
    self.split_limit(depth) * self.merge_hysteresis
  }

  /// Check every field against its contract.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.min_depth > self.max_depth {
      return Err(ConfigError::DepthRange {
        min: self.min_depth,
        max: self.max_depth,
      });
    }
    if self.max_depth > QuadtreePath::MAX_DEPTH {
      return Err(ConfigError::DepthLimit {
        max: self.max_depth,
        limit: QuadtreePath::MAX_DEPTH,
      });
    }
    if !(self.chunk_length.is_finite() && self.chunk_length > 0.0) {
      return Err(ConfigError::ChunkLength(self.chunk_length));
    }
    if self.base_subdivisions == 0 {
      return Err(ConfigError::Subdivisions);
    }
    if !(self.render_distance_factor.is_finite() && self.render_distance_factor > 0.0) {
      return Err(ConfigError::RenderDistance(self.render_distance_factor));
    }
    if !(self.merge_hysteresis.is_finite() && self.merge_hysteresis >= 1.0) {
      return Err(ConfigError::Hysteresis(self.merge_hysteresis));
    }
    if !self.base_subdivisions.is_power_of_two() {
      tracing::warn!(
        subdivisions = self.base_subdivisions,
        "base_subdivisions is not a power of two; edges of neighbouring LODs will not line up"
      );
    }
    Ok(())
  }

  /// Parse from TOML and validate.
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  /// Smallest depth at which adjacent vertices are at most
  /// `min_vertex_spacing` apart.
  pub fn max_depth_for_spacing(root_length: f64, min_vertex_spacing: f64, subdivisions: u32) -> u32 {
    let ratio = root_length / (min_vertex_spacing * subdivisions as f64);
    if !ratio.is_finite() || ratio <= 1.0 {
      return 0;
    }
    (ratio.log2().ceil() as u32).min(QuadtreePath::MAX_DEPTH)
  }
}

impl Default for PlanetConfig {
  fn default() -> Self {
    Self {
      min_depth: 1,
      max_depth: 12,
      chunk_length: 2_000_000.0,
      base_subdivisions: DEFAULT_SUBDIVISIONS,
      render_distance_factor: 3.0,
      merge_hysteresis: 1.0,
      deferred_deletion: false,
      seed: 0,
    }
  }
}

/// Where chunk builds execute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Execution {
  /// Dedicated worker threads.
  #[default]
  Threaded,
  /// On the orchestrator thread, inside `ChunkForge::update`.
  Inline,
}

/// Worker pool settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
  /// Number of workers. `None` reserves one hardware thread for the
  /// orchestrator: `max(1, available_parallelism - 1)`.
  pub worker_count: Option<usize>,

  pub execution: Execution,
}

impl ForgeConfig {
  /// Bounded worker count actually used by the pool.
  pub fn resolved_worker_count(&self) -> usize {
    match self.worker_count {
      Some(count) => count,
      None => {
        let hardware = std::thread::available_parallelism()
          .map(|n| n.get())
          .unwrap_or(1);
        hardware.saturating_sub(1).max(1)
      }
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.worker_count == Some(0) {
      return Err(ConfigError::WorkerCount);
    }
    Ok(())
  }

  /// Inline execution with a fixed worker count.
  pub fn inline(worker_count: usize) -> Self {
    Self {
      worker_count: Some(worker_count),
      execution: Execution::Inline,
    }
  }

  /// Threaded execution with a fixed worker count.
  pub fn threaded(worker_count: usize) -> Self {
    Self {
      worker_count: Some(worker_count),
      execution: Execution::Threaded,
    }
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
