//! Forge statistics: lifetime counters plus a rolling window of build times.
//!
//! ```ignore
//! let metrics = forge.metrics();
//! println!(
//!   "applied {} / discarded {} ({:.0}us avg build)",
//!   metrics.applied,
//!   metrics.discarded,
//!   metrics.build_timings.average()
//! );
//! ```

use std::collections::VecDeque;

/// Fixed-capacity window of recent values, oldest evicted first.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity: capacity.max(1),
    }
  }

  /// Push a new value, evicting the oldest if at capacity.
  pub fn push(&mut self, value: T) {
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
  }

  /// Oldest to newest.
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    self.buffer.iter()
  }

  pub fn last(&self) -> Option<&T> {
    self.buffer.back()
  }
}

impl RollingWindow<u64> {
  pub fn sum(&self) -> u64 {
    self.buffer.iter().sum()
  }

  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.sum() as f64 / self.buffer.len() as f64
    }
  }

  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = self.buffer.iter().min()?;
    let max = self.buffer.iter().max()?;
    Some((*min, *max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(128)
  }
}

/// Counters maintained by `ChunkForge`.
///
/// Everything except `build_timings` is cumulative over the forge lifetime,
/// including across `reset()`.
#[derive(Debug, Clone, Default)]
pub struct ForgeMetrics {
  /// Build tasks accepted into the queue.
  pub submitted: u64,
  /// Build tasks handed to a worker.
  pub dispatched: u64,
  /// Results handed to the mesh sink.
  pub applied: u64,
  /// Results dropped because their chunk was disposed or the epoch moved on.
  pub discarded: u64,
  /// Queued builds removed by a deletion before they were dispatched.
  pub cancelled: u64,
  /// Builds that panicked on a worker.
  pub failed: u64,
  /// Resources released through the mesh sink.
  pub released: u64,
  /// Highest number of builds observed running at once.
  pub peak_concurrent: usize,
  /// Recent worker build times in microseconds.
  pub build_timings: RollingWindow<u64>,
}

impl ForgeMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record_build_time(&mut self, build_time_us: u64) {
    self.build_timings.push(build_time_us);
  }
}
