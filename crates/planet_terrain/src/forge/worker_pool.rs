//! Bounded pool of chunk builders.
//!
//! ```text
//!            submit_task                     dispatch
//!  tasks ──────────────► BinaryHeap ───────────────────────► worker (busy)
//!                     (depth, seq) asc                         │
//!                                                              │ WorkerMessage
//!  available ◄── recycle_finished ◄── finished ◄── complete ◄──┘  (channel)
//!                                                   │
//!                                                   └─ more queued? redispatch
//! ```
//!
//! Workers never touch pool bookkeeping. They receive an owned task and send
//! one message back; the orchestrator drains the channel and is the only
//! mutator of the `available` / `busy` / `finished` lists. A worker id is
//! handed out only from `available` (or kept by `complete` when it is
//! redispatched), so no worker ever holds two tasks.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use web_time::Instant;

use crate::config::{Execution, ForgeConfig};
use crate::error::TerrainError;
use crate::quadtree::ChunkId;

use super::task::{BuildResult, BuildTask, Epoch};

/// Index of a worker slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "worker-{}", self.0)
  }
}

/// Sent by a worker when its task ends.
#[derive(Debug)]
pub enum WorkerMessage {
  Built { worker: WorkerId, result: BuildResult },
  /// The build panicked. The task is dropped.
  Failed { worker: WorkerId, chunk: ChunkId },
}

impl WorkerMessage {
  pub fn worker(&self) -> WorkerId {
    match self {
      WorkerMessage::Built { worker, .. } | WorkerMessage::Failed { worker, .. } => *worker,
    }
  }
}

// Max-heap entry ordered so the shallowest, oldest task pops first
struct QueuedTask {
  task: BuildTask,
  seq: u64,
}

impl QueuedTask {
  fn key(&self) -> (u32, u64) {
    (self.task.priority(), self.seq)
  }
}

impl PartialEq for QueuedTask {
  fn eq(&self, other: &Self) -> bool {
    self.key() == other.key()
  }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for QueuedTask {
  fn cmp(&self, other: &Self) -> Ordering {
    other.key().cmp(&self.key())
  }
}

enum Executor {
  Threaded(rayon::ThreadPool),
  Inline,
}

/// Priority queue plus worker lifecycle lists.
pub struct WorkerPool {
  queue: BinaryHeap<QueuedTask>,
  next_seq: u64,
  available: Vec<WorkerId>,
  busy: Vec<WorkerId>,
  finished: Vec<WorkerId>,
  executor: Executor,
  sender: Sender<WorkerMessage>,
  receiver: Receiver<WorkerMessage>,
  running: Arc<AtomicUsize>,
  peak: Arc<AtomicUsize>,
}

impl WorkerPool {
  pub fn new(config: &ForgeConfig) -> Result<Self, TerrainError> {
    config.validate()?;
    let worker_count = config.resolved_worker_count();

    let executor = match config.execution {
      Execution::Threaded => Executor::Threaded(
        rayon::ThreadPoolBuilder::new()
          .num_threads(worker_count)
          .thread_name(|i| format!("chunk-builder-{}", i))
          .build()?,
      ),
      Execution::Inline => Executor::Inline,
    };

    let (sender, receiver) = crossbeam_channel::unbounded();

    // Reverse so pop() hands out worker-0 first
    let available = (0..worker_count).rev().map(WorkerId).collect();

    Ok(Self {
      queue: BinaryHeap::new(),
      next_seq: 0,
      available,
      busy: Vec::with_capacity(worker_count),
      finished: Vec::with_capacity(worker_count),
      executor,
      sender,
      receiver,
      running: Arc::new(AtomicUsize::new(0)),
      peak: Arc::new(AtomicUsize::new(0)),
    })
  }

  // =========================================================================
  // Queue
  // =========================================================================

  pub fn submit_task(&mut self, task: BuildTask) {
    let seq = self.next_seq;
    self.next_seq += 1;
    self.queue.push(QueuedTask { task, seq });
  }

  pub fn has_task(&self) -> bool {
    !self.queue.is_empty()
  }

  /// Pop the highest-priority task.
  pub fn next_task(&mut self) -> Option<BuildTask> {
    self.queue.pop().map(|queued| queued.task)
  }

  /// Remove a queued (not yet dispatched) task. Returns whether it was found.
  pub fn cancel(&mut self, id: ChunkId) -> bool {
    let before = self.queue.len();
    self.queue.retain(|queued| queued.task.id != id);
    self.queue.len() != before
  }

  /// Drop every queued task, returning how many were dropped.
  pub fn clear_queue(&mut self) -> usize {
    let dropped = self.queue.len();
    self.queue.clear();
    dropped
  }

  pub fn queued_len(&self) -> usize {
    self.queue.len()
  }

  // =========================================================================
  // Workers
  // =========================================================================

  pub fn worker_count(&self) -> usize {
    self.available.len() + self.busy.len() + self.finished.len()
  }

  pub fn available(&self) -> &[WorkerId] {
    &self.available
  }

  pub fn busy(&self) -> &[WorkerId] {
    &self.busy
  }

  pub fn finished(&self) -> &[WorkerId] {
    &self.finished
  }

  /// Builds executing right now.
  pub fn running(&self) -> usize {
    self.running.load(AtomicOrdering::Acquire)
  }

  /// Highest concurrent build count observed.
  pub fn peak_concurrent(&self) -> usize {
    self.peak.load(AtomicOrdering::Acquire)
  }

  /// Move every finished worker back to `available`.
  pub fn recycle_finished(&mut self) {
    self.available.append(&mut self.finished);
  }

  /// Hand the next queued task to an available worker.
  ///
  /// Returns the worker and chunk dispatched, or `None` when either list is
  /// empty.
  pub fn dispatch_next(&mut self, epoch: Epoch) -> Option<(WorkerId, ChunkId)> {
    if self.queue.is_empty() {
      return None;
    }
    let worker = self.available.pop()?;
    let task = self.next_task()?;
    let chunk = task.id;
    self.busy.push(worker);
    self.spawn(worker, task, epoch);
    Some((worker, chunk))
  }

  /// A busy worker reported back. Redispatch it if work is queued, otherwise
  /// move it to `finished`.
  pub fn complete(&mut self, worker: WorkerId, epoch: Epoch) -> Option<ChunkId> {
    if let Some(task) = self.next_task() {
      let chunk = task.id;
      self.spawn(worker, task, epoch);
      return Some(chunk);
    }
    if let Some(pos) = self.busy.iter().position(|&w| w == worker) {
      self.busy.swap_remove(pos);
      self.finished.push(worker);
    }
    None
  }

  /// Every completion message already sent, without blocking.
  ///
  /// Messages produced while the caller handles this batch (inline
  /// redispatches) wait for the next call.
  pub fn drain(&self) -> Vec<WorkerMessage> {
    self.receiver.try_iter().collect()
  }

  fn spawn(&self, worker: WorkerId, task: BuildTask, epoch: Epoch) {
    let sender = self.sender.clone();
    let running = Arc::clone(&self.running);
    let peak = Arc::clone(&self.peak);

    let job = move || {
      let now = running.fetch_add(1, AtomicOrdering::AcqRel) + 1;
      peak.fetch_max(now, AtomicOrdering::AcqRel);

      let chunk = task.id;
      let start = Instant::now();
      let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.execute()));
      let build_time_us = start.elapsed().as_micros() as u64;
      running.fetch_sub(1, AtomicOrdering::AcqRel);

      let message = match outcome {
        Ok(mesh) => WorkerMessage::Built {
          worker,
          result: BuildResult {
            id: chunk,
            epoch,
            mesh,
            build_time_us,
          },
        },
        Err(_) => WorkerMessage::Failed { worker, chunk },
      };
      // Receiver is gone only when the pool was dropped
      let _ = sender.send(message);
    };

    match &self.executor {
      Executor::Threaded(pool) => pool.spawn(job),
      Executor::Inline => job(),
    }
  }
}

#[cfg(test)]
#[path = "worker_pool_test.rs"]
mod worker_pool_test;
