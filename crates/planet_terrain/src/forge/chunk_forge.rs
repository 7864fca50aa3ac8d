//! Per-tick orchestration of chunk builds and deletions.
//!
//! ```text
//! update(sink):
//!   1. drain worker messages  → apply queue, redispatch or finish worker
//!   2. finished → available
//!   3. dispatch while workers and tasks remain
//!   4. deletions              → release applied resources, mark the rest disposed
//!   5. apply at most one result (skipping disposed and stale ones)
//! ```
//!
//! `update` never blocks on a worker; it only consumes what has already been
//! reported. Cancellation is cooperative: an in-flight build for a deleted
//! chunk still runs, and its result is dropped when it reaches the front of
//! the apply queue.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::ForgeConfig;
use crate::error::TerrainError;
use crate::metrics::ForgeMetrics;
use crate::quadtree::{ChunkId, MeshHandle};

use super::sink::{MeshSink, ResourceId};
use super::task::{BuildResult, DeletionTask, Epoch, Task, TaskSink};
use super::worker_pool::{WorkerMessage, WorkerPool};

/// A mesh handed to the sink during `update`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AppliedChunk {
  pub id: ChunkId,
  pub resource: ResourceId,
  pub average_height: f64,
}

pub struct ChunkForge {
  pool: WorkerPool,
  apply_queue: VecDeque<BuildResult>,
  trash: Vec<DeletionTask>,
  /// Deleted before their build came back; results are dropped on sight.
  disposed: HashSet<ChunkId>,
  /// Dispatched and not yet reported.
  in_flight: HashSet<ChunkId>,
  /// Applied and not yet released.
  live: HashMap<ChunkId, ResourceId>,
  epoch: Epoch,
  metrics: ForgeMetrics,
}

impl ChunkForge {
  pub fn new(config: &ForgeConfig) -> Result<Self, TerrainError> {
    let pool = WorkerPool::new(config)?;
    tracing::info!(
      workers = pool.worker_count(),
      execution = ?config.execution,
      "chunk forge started"
    );
    Ok(Self {
      pool,
      apply_queue: VecDeque::new(),
      trash: Vec::new(),
      disposed: HashSet::new(),
      in_flight: HashSet::new(),
      live: HashMap::new(),
      epoch: Epoch::new(),
      metrics: ForgeMetrics::new(),
    })
  }

  /// Run one tick. Returns the chunk applied this tick, if any.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "forge::update"))]
  pub fn update<S: MeshSink>(&mut self, sink: &mut S) -> Option<AppliedChunk> {
    self.drain_completions();
    self.pool.recycle_finished();
    self.dispatch();
    self.empty_trash(sink);
    self.apply_next(sink)
  }

  /// Forget all queued work. Results of builds already running are dropped
  /// when they arrive; applied resources stay live until deleted.
  pub fn reset(&mut self) {
    self.epoch.increment();
    let dropped = self.pool.clear_queue();
    self.metrics.cancelled += dropped as u64;
    self.metrics.discarded += self.apply_queue.len() as u64;
    self.apply_queue.clear();
    let in_flight = &self.in_flight;
    self.disposed.retain(|id| in_flight.contains(id));
    tracing::info!(epoch = self.epoch.0, dropped, "chunk forge reset");
  }

  // =========================================================================
  // Queries
  // =========================================================================

  pub fn metrics(&self) -> &ForgeMetrics {
    &self.metrics
  }

  pub fn epoch(&self) -> Epoch {
    self.epoch
  }

  pub fn worker_count(&self) -> usize {
    self.pool.worker_count()
  }

  pub fn pool(&self) -> &WorkerPool {
    &self.pool
  }

  /// Builds waiting for a worker.
  pub fn queued(&self) -> usize {
    self.pool.queued_len()
  }

  pub fn in_flight(&self) -> usize {
    self.in_flight.len()
  }

  /// Results waiting to be applied.
  pub fn apply_queue_len(&self) -> usize {
    self.apply_queue.len()
  }

  /// Applied resources not yet released.
  pub fn live_count(&self) -> usize {
    self.live.len()
  }

  pub fn is_live(&self, id: ChunkId) -> bool {
    self.live.contains_key(&id)
  }

  /// No queued, running, unapplied or undeleted work remains.
  pub fn is_idle(&self) -> bool {
    !self.pool.has_task()
      && self.in_flight.is_empty()
      && self.apply_queue.is_empty()
      && self.trash.is_empty()
  }

  // =========================================================================
  // Tick stages
  // =========================================================================

  fn drain_completions(&mut self) {
    for message in self.pool.drain() {
      let worker = message.worker();
      match message {
        WorkerMessage::Built { result, .. } => {
          self.in_flight.remove(&result.id);
          self.metrics.record_build_time(result.build_time_us);
          self.apply_queue.push_back(result);
        }
        WorkerMessage::Failed { chunk, .. } => {
          self.in_flight.remove(&chunk);
          self.disposed.remove(&chunk);
          self.metrics.failed += 1;
          tracing::warn!(%chunk, %worker, "chunk build panicked; the chunk will not resolve");
        }
      }
      if let Some(chunk) = self.pool.complete(worker, self.epoch) {
        self.mark_dispatched(chunk);
      }
    }
  }

  fn dispatch(&mut self) {
    while let Some((worker, chunk)) = self.pool.dispatch_next(self.epoch) {
      tracing::trace!(%chunk, %worker, "dispatched");
      self.mark_dispatched(chunk);
    }
  }

  fn mark_dispatched(&mut self, chunk: ChunkId) {
    self.in_flight.insert(chunk);
    self.metrics.dispatched += 1;
    self.metrics.peak_concurrent = self.metrics.peak_concurrent.max(self.pool.peak_concurrent());
  }

  fn empty_trash<S: MeshSink>(&mut self, sink: &mut S) {
    for task in std::mem::take(&mut self.trash) {
      if let Some(resource) = self.live.remove(&task.id) {
        sink.release(task.id, resource);
        self.metrics.released += 1;
        continue;
      }
      if let MeshHandle::Ready(resource) = task.mesh {
        tracing::debug!(chunk = %task.id, ?resource, "deletion for a resource this forge never applied");
      }
      let pending = self.in_flight.contains(&task.id)
        || self.apply_queue.iter().any(|result| result.id == task.id);
      if pending {
        self.disposed.insert(task.id);
      }
    }
  }

  fn apply_next<S: MeshSink>(&mut self, sink: &mut S) -> Option<AppliedChunk> {
    while let Some(result) = self.apply_queue.pop_front() {
      if self.disposed.remove(&result.id) {
        self.metrics.discarded += 1;
        tracing::debug!(chunk = %result.id, "discarding result for disposed chunk");
        continue;
      }
      if result.epoch != self.epoch {
        self.metrics.discarded += 1;
        tracing::debug!(chunk = %result.id, epoch = result.epoch.0, "discarding stale result");
        continue;
      }

      let resource = sink.apply(result.id, &result.mesh);
      self.live.insert(result.id, resource);
      self.metrics.applied += 1;
      return Some(AppliedChunk {
        id: result.id,
        resource,
        average_height: result.mesh.average_height,
      });
    }
    None
  }
}

impl TaskSink for ChunkForge {
  fn add_task(&mut self, task: Task) {
    match task {
      Task::Build(build) => {
        self.metrics.submitted += 1;
        self.pool.submit_task(build);
      }
      Task::Delete(deletion) => {
        if self.pool.cancel(deletion.id) {
          self.metrics.cancelled += 1;
          tracing::debug!(chunk = %deletion.id, "cancelled queued build");
        }
        self.trash.push(deletion);
      }
    }
  }
}

#[cfg(test)]
#[path = "chunk_forge_test.rs"]
mod chunk_forge_test;
