//! Planet - six face quadtrees sharing one configuration, terrain snapshot
//! and transform.
//!
//! Each planet is isolated: its chunks carry its `PlanetId`, so results
//! coming back from a shared forge are routed to the right planet (or
//! ignored by the others).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::{DAffine3, DVec3};

use crate::config::PlanetConfig;
use crate::direction::Direction;
use crate::error::TerrainError;
use crate::forge::{AppliedChunk, TaskSink};
use crate::quadtree::{LodContext, LodStats, PlanetChunk, PlanetSide};
use crate::terrain::TerrainSettings;

// =============================================================================
// PlanetId - unique identifier
// =============================================================================

static PLANET_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque planet identifier, unique within the process lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PlanetId(u64);

impl PlanetId {
  pub fn new() -> Self {
    Self(PLANET_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  pub fn raw(&self) -> u64 {
    self.0
  }
}

impl Default for PlanetId {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for PlanetId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "planet-{}", self.0)
  }
}

// =============================================================================
// Observer
// =============================================================================

/// Camera-like input to an LOD pass, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observer {
  pub position: DVec3,
  /// Carried for callers; the split rule only looks at distance.
  pub facing: DVec3,
}

impl Observer {
  pub fn new(position: DVec3, facing: DVec3) -> Self {
    Self { position, facing }
  }

  /// Observer at `position` looking at the world origin.
  pub fn looking_at_origin(position: DVec3) -> Self {
    Self {
      position,
      facing: (-position).normalize_or_zero(),
    }
  }
}

// =============================================================================
// Planet
// =============================================================================

pub struct Planet {
  id: PlanetId,
  config: PlanetConfig,
  terrain: Arc<TerrainSettings>,
  /// Planet-to-world transform.
  transform: DAffine3,
  /// Indexed by `Direction::index`.
  sides: [PlanetSide; 6],
}

impl Planet {
  /// Validate `config` and seed every face with its root leaf.
  pub fn new(
    config: PlanetConfig,
    terrain: Arc<TerrainSettings>,
    tasks: &mut impl TaskSink,
  ) -> Result<Self, TerrainError> {
    Self::with_transform(config, terrain, DAffine3::IDENTITY, tasks)
  }

  pub fn with_transform(
    config: PlanetConfig,
    terrain: Arc<TerrainSettings>,
    transform: DAffine3,
    tasks: &mut impl TaskSink,
  ) -> Result<Self, TerrainError> {
    config.validate()?;
    let id = PlanetId::new();
    let ctx = LodContext {
      config: &config,
      terrain: &terrain,
      transform: &transform,
    };
    let sides = std::array::from_fn(|i| PlanetSide::new(id, Direction::ALL[i], &ctx, tasks));
    tracing::info!(
      planet = %id,
      radius = config.radius(),
      min_depth = config.min_depth,
      max_depth = config.max_depth,
      "planet created"
    );
    Ok(Self {
      id,
      config,
      terrain,
      transform,
      sides,
    })
  }

  #[inline]
  pub fn id(&self) -> PlanetId {
    self.id
  }

  pub fn config(&self) -> &PlanetConfig {
    &self.config
  }

  pub fn terrain(&self) -> &Arc<TerrainSettings> {
    &self.terrain
  }

  pub fn transform(&self) -> DAffine3 {
    self.transform
  }

  /// Sea-level radius.
  #[inline]
  pub fn radius(&self) -> f64 {
    self.config.radius()
  }

  pub fn sides(&self) -> &[PlanetSide; 6] {
    &self.sides
  }

  pub fn side(&self, direction: Direction) -> &PlanetSide {
    &self.sides[direction.index()]
  }

  /// Move the planet. Takes effect on the next LOD pass.
  pub fn set_transform(&mut self, transform: DAffine3) {
    self.transform = transform;
  }

  /// Swap the terrain snapshot. Only chunks built from now on see it; call
  /// `reset` to rebuild the rest.
  pub fn set_terrain(&mut self, terrain: Arc<TerrainSettings>) {
    self.terrain = terrain;
  }

  // ===========================================================================
  // LOD
  // ===========================================================================

  /// Run one split/merge pass on every face.
  pub fn update_lod(&mut self, observer: &Observer, tasks: &mut impl TaskSink) -> LodStats {
    let ctx = LodContext {
      config: &self.config,
      terrain: &self.terrain,
      transform: &self.transform,
    };
    let mut stats = LodStats::default();
    for side in &mut self.sides {
      stats += side.update_lod(observer.position, &ctx, tasks);
    }
    if !stats.is_unchanged() {
      tracing::debug!(
        planet = %self.id,
        splits = stats.splits,
        merges = stats.merges,
        builds = stats.builds_issued,
        deletions = stats.deletions_issued,
        "lod updated"
      );
    }
    stats
  }

  /// Record a mesh applied by the forge. Returns `false` for chunks of
  /// another planet or chunks no longer in the tree.
  pub fn record_applied(&mut self, applied: &AppliedChunk) -> bool {
    if applied.id.planet != self.id {
      return false;
    }
    self.sides[applied.id.direction.index()].record_applied(
      applied.id,
      applied.resource,
      applied.average_height,
    )
  }

  /// Delete every chunk and reseed all six root leaves.
  pub fn reset(&mut self, tasks: &mut impl TaskSink) -> LodStats {
    let ctx = LodContext {
      config: &self.config,
      terrain: &self.terrain,
      transform: &self.transform,
    };
    let mut stats = LodStats::default();
    for side in &mut self.sides {
      stats += side.reset(&ctx, tasks);
    }
    tracing::info!(planet = %self.id, deleted = stats.deletions_issued, "planet reset");
    stats
  }

  /// Delete every chunk. Returns how many deletions were issued.
  pub fn dispose(self, tasks: &mut impl TaskSink) -> usize {
    let id = self.id;
    let deleted: usize = self
      .sides
      .into_iter()
      .map(|side| side.dispose(tasks))
      .sum();
    tracing::info!(planet = %id, deleted, "planet disposed");
    deleted
  }

  // ===========================================================================
  // Queries
  // ===========================================================================

  /// Leaf whose face region contains the direction of `world_point`.
  /// `None` when the point sits at the planet center.
  pub fn leaf_containing(&self, world_point: DVec3) -> Option<&PlanetChunk> {
    let local = self.transform.inverse().transform_point3(world_point);
    if local.length_squared() == 0.0 {
      return None;
    }
    let direction = Direction::dominant(local);
    let plane = direction.rotation().transpose() * local;
    // Forward-face plane sits at z = -L/2
    let on_face = plane * (-self.config.chunk_length / 2.0 / plane.z);
    Some(self.sides[direction.index()].leaf_at_plane(on_face.x, on_face.y, self.config.chunk_length))
  }

  pub fn leaf_count(&self) -> usize {
    self.sides.iter().map(PlanetSide::leaf_count).sum()
  }

  pub fn max_leaf_depth(&self) -> u32 {
    self
      .sides
      .iter()
      .map(PlanetSide::max_leaf_depth)
      .max()
      .unwrap_or_default()
  }

  pub fn for_each_chunk<'a>(&'a self, mut f: impl FnMut(&'a PlanetChunk)) {
    for side in &self.sides {
      side.for_each_chunk(&mut f);
    }
  }

  /// Leaves whose mesh has been applied.
  pub fn ready_count(&self) -> usize {
    let mut ready = 0;
    self.for_each_chunk(|chunk| ready += chunk.is_ready() as usize);
    ready
  }

  /// Mean of the six faces' average heights.
  pub fn average_height(&self) -> Option<f64> {
    let known: Vec<f64> = self.sides.iter().filter_map(PlanetSide::average_height).collect();
    if known.is_empty() {
      None
    } else {
      Some(known.iter().sum::<f64>() / known.len() as f64)
    }
  }
}

impl fmt::Debug for Planet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Planet")
      .field("id", &self.id)
      .field("radius", &self.radius())
      .field("leaves", &self.leaf_count())
      .field("max_depth", &self.max_leaf_depth())
      .finish()
  }
}

#[cfg(test)]
#[path = "planet_test.rs"]
mod planet_test;
