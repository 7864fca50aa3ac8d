//! Leaf chunk data and identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::DVec3;

use crate::config::PlanetConfig;
use crate::direction::Direction;
use crate::forge::{BuildTask, ResourceId};
use crate::planet::PlanetId;
use crate::terrain::TerrainSettings;

use super::path::QuadtreePath;

static CHUNK_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Identity of one chunk instance.
///
/// Two chunks created at the same path (a leaf merged away and split back in)
/// get different serials, so a late result for the first one can never land
/// on the second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkId {
  pub planet: PlanetId,
  pub direction: Direction,
  pub path: QuadtreePath,
  pub serial: u64,
}

impl ChunkId {
  /// Allocate a fresh id for a chunk at `path`.
  pub fn new(planet: PlanetId, direction: Direction, path: QuadtreePath) -> Self {
    Self {
      planet,
      direction,
      path,
      serial: CHUNK_SERIAL.fetch_add(1, Ordering::Relaxed),
    }
  }

  #[inline]
  pub fn depth(&self) -> u32 {
    self.path.depth()
  }
}

impl fmt::Display for ChunkId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[D{}][P{}]#{}", self.direction, self.path, self.serial)
  }
}

/// Renderer resource backing a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MeshHandle {
  /// Build requested, not applied yet.
  #[default]
  Pending,
  /// Applied; the renderer owns the resource.
  Ready(ResourceId),
}

impl MeshHandle {
  #[inline]
  pub fn is_ready(&self) -> bool {
    matches!(self, MeshHandle::Ready(_))
  }

  #[inline]
  pub fn resource(&self) -> Option<ResourceId> {
    match self {
      MeshHandle::Ready(resource) => Some(*resource),
      MeshHandle::Pending => None,
    }
  }
}

/// A leaf of a face quadtree.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanetChunk {
  pub id: ChunkId,
  /// Center on the Forward face at `z = -L/2`, before the face rotation.
  pub position: DVec3,
  pub side_length: f64,
  pub mesh: MeshHandle,
  /// Mean vertex elevation, known once the mesh is applied.
  pub average_height: Option<f64>,
}

impl PlanetChunk {
  pub fn new(id: ChunkId, root_length: f64) -> Self {
    Self {
      id,
      position: id.path.cube_position(root_length),
      side_length: id.path.size(root_length),
      mesh: MeshHandle::Pending,
      average_height: None,
    }
  }

  #[inline]
  pub fn path(&self) -> QuadtreePath {
    self.id.path
  }

  #[inline]
  pub fn depth(&self) -> u32 {
    self.id.depth()
  }

  #[inline]
  pub fn direction(&self) -> Direction {
    self.id.direction
  }

  #[inline]
  pub fn is_ready(&self) -> bool {
    self.mesh.is_ready()
  }

  /// Projected center in planet space.
  pub fn sphere_position(&self, radius: f64) -> DVec3 {
    (self.direction().rotation() * self.position).normalize() * radius
  }

  /// Build request for this chunk under the current terrain snapshot.
  pub fn build_task(&self, config: &PlanetConfig, terrain: &Arc<TerrainSettings>) -> BuildTask {
    BuildTask {
      id: self.id,
      direction: self.direction(),
      depth: self.depth(),
      position: self.position,
      chunk_length: self.side_length,
      vertices_per_row: config.vertices_per_row(),
      terrain: Arc::clone(terrain),
      seed: config.seed,
    }
  }
}
