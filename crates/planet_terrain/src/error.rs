//! Error types for contract violations at the public API boundary.
//!
//! Races against disposal and worker failures are not errors; they are
//! absorbed by the forge and only show up in logs and metrics.

use thiserror::Error;

/// Top-level error for fallible terrain operations.
#[derive(Debug, Error)]
pub enum TerrainError {
  #[error("invalid configuration: {0}")]
  Config(#[from] ConfigError),

  #[error("quadtree child index {0} is out of range (expected 0..=3)")]
  InvalidChildIndex(u8),

  #[error("quadtree path exceeds the maximum depth of {max}")]
  PathTooDeep { max: u32 },

  #[error("failed to start chunk worker pool: {0}")]
  WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Validation failures for configuration inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("min_depth ({min}) must not exceed max_depth ({max})")]
  DepthRange { min: u32, max: u32 },

  #[error("max_depth ({max}) exceeds the supported quadtree depth of {limit}")]
  DepthLimit { max: u32, limit: u32 },

  #[error("chunk_length must be positive and finite, got {0}")]
  ChunkLength(f64),

  #[error("base_subdivisions must be at least 1")]
  Subdivisions,

  #[error("render_distance_factor must be positive and finite, got {0}")]
  RenderDistance(f64),

  #[error("merge_hysteresis must be finite and >= 1.0, got {0}")]
  Hysteresis(f64),

  #[error("worker_count must be at least 1")]
  WorkerCount,

  #[error(transparent)]
  Toml(#[from] toml::de::Error),
}
