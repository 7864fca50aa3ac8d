//! Deferred deletion of replaced chunks.
//!
//! When a leaf splits (or a branch merges), the replaced chunks that are
//! already on screen are held back until every replacement is either applied
//! or itself removed from the tree. That hides the gap between "old mesh
//! deleted" and "new mesh applied".

use smallvec::SmallVec;

use crate::forge::{DeletionTask, Task, TaskSink};

use super::chunk::{ChunkId, PlanetChunk};
use super::node::QuadtreeNode;

#[derive(Clone, Debug, PartialEq)]
pub struct DeleteSemaphore {
  /// Replacement chunks that must resolve first.
  pending: SmallVec<[ChunkId; 4]>,
  /// Chunks released once the semaphore resolves.
  doomed: Vec<PlanetChunk>,
}

impl DeleteSemaphore {
  pub fn new(pending: impl Into<SmallVec<[ChunkId; 4]>>, doomed: Vec<PlanetChunk>) -> Self {
    Self {
      pending: pending.into(),
      doomed,
    }
  }

  pub fn doomed(&self) -> &[PlanetChunk] {
    &self.doomed
  }

  pub fn pending(&self) -> &[ChunkId] {
    &self.pending
  }

  /// Every replacement is applied or gone from `root`.
  pub fn is_resolved(&self, root: &QuadtreeNode) -> bool {
    self
      .pending
      .iter()
      .all(|&id| root.find(id).map_or(true, PlanetChunk::is_ready))
  }

  /// Issue the held deletions. Returns how many were issued.
  pub fn release(self, tasks: &mut impl TaskSink) -> usize {
    let count = self.doomed.len();
    for chunk in self.doomed {
      tasks.add_task(Task::Delete(DeletionTask {
        id: chunk.id,
        mesh: chunk.mesh,
      }));
    }
    count
  }
}

#[cfg(test)]
#[path = "semaphore_test.rs"]
mod semaphore_test;
