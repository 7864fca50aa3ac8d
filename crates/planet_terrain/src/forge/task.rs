//! Work items exchanged between the quadtree, the forge and its workers.

use std::sync::Arc;

use glam::DVec3;

use crate::direction::Direction;
use crate::mesh::{self, ChunkMesh};
use crate::quadtree::{ChunkId, MeshHandle};
use crate::terrain::TerrainSettings;

/// Forge generation counter; results from an older epoch are stale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(pub u64);

impl Epoch {
  pub fn new() -> Self {
    Self(0)
  }

  pub fn increment(&mut self) {
    self.0 += 1;
  }
}

/// Request to build one chunk mesh. Immutable once enqueued.
#[derive(Clone, Debug)]
pub struct BuildTask {
  pub id: ChunkId,
  pub direction: Direction,
  pub depth: u32,
  /// Chunk center in cube space before the face rotation.
  pub position: DVec3,
  /// Side length of the chunk.
  pub chunk_length: f64,
  pub vertices_per_row: usize,
  /// Terrain snapshot taken when the task was created.
  pub terrain: Arc<TerrainSettings>,
  pub seed: u64,
}

impl BuildTask {
  /// Lower runs first.
  #[inline]
  pub fn priority(&self) -> u32 {
    self.depth
  }

  /// Run the mesh builder. Panics on malformed geometry.
  pub fn execute(&self) -> ChunkMesh {
    mesh::build(
      self.direction,
      self.depth,
      self.position,
      self.chunk_length,
      self.vertices_per_row,
      &self.terrain,
      self.seed,
    )
  }
}

/// Instruction to release a chunk's renderer resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeletionTask {
  pub id: ChunkId,
  /// Handle as last seen by the quadtree.
  pub mesh: MeshHandle,
}

#[derive(Clone, Debug)]
pub enum Task {
  Build(BuildTask),
  Delete(DeletionTask),
}

impl Task {
  pub fn id(&self) -> ChunkId {
    match self {
      Task::Build(task) => task.id,
      Task::Delete(task) => task.id,
    }
  }

  pub fn is_build(&self) -> bool {
    matches!(self, Task::Build(_))
  }
}

/// Output of one worker build.
#[derive(Clone, Debug)]
pub struct BuildResult {
  pub id: ChunkId,
  pub epoch: Epoch,
  pub mesh: ChunkMesh,
  pub build_time_us: u64,
}

/// Anything that accepts build and deletion tasks.
pub trait TaskSink {
  fn add_task(&mut self, task: Task);
}

/// Collects tasks without running them.
impl TaskSink for Vec<Task> {
  fn add_task(&mut self, task: Task) {
    self.push(task);
  }
}
