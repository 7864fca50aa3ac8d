use super::*;

use std::sync::Arc;
use std::time::Duration;

use crate::direction::Direction;
use crate::forge::{BuildTask, MeshStore};
use crate::planet::PlanetId;
use crate::quadtree::QuadtreePath;
use crate::terrain::TerrainSettings;

fn task_at(depth: u32, vertices_per_row: usize) -> BuildTask {
  let path = QuadtreePath::from_indices(&vec![1; depth as usize]).unwrap();
  BuildTask {
    id: ChunkId::new(PlanetId::new(), Direction::Up, path),
    direction: Direction::Up,
    depth,
    position: path.cube_position(10.0),
    chunk_length: path.size(10.0),
    vertices_per_row,
    terrain: Arc::new(TerrainSettings::flat()),
    seed: 0,
  }
}

fn inline_forge(workers: usize) -> ChunkForge {
  ChunkForge::new(&ForgeConfig::inline(workers)).unwrap()
}

fn delete(id: ChunkId) -> Task {
  Task::Delete(DeletionTask {
    id,
    mesh: MeshHandle::Pending,
  })
}

/// Tick until idle, returning the applied chunks in order.
fn run_until_idle(forge: &mut ChunkForge, store: &mut MeshStore) -> Vec<AppliedChunk> {
  let mut applied = Vec::new();
  for _ in 0..1000 {
    if let Some(chunk) = forge.update(store) {
      applied.push(chunk);
    }
    if forge.is_idle() {
      return applied;
    }
  }
  panic!("forge did not go idle");
}

#[test]
fn test_applies_at_most_one_result_per_tick() {
  let mut forge = inline_forge(2);
  let mut store = MeshStore::new();
  for _ in 0..4 {
    forge.add_task(Task::Build(task_at(1, 3)));
  }

  let mut ticks = 0;
  while !forge.is_idle() {
    let before = store.applied;
    forge.update(&mut store);
    assert!(store.applied - before <= 1);
    ticks += 1;
    assert!(ticks < 100);
  }
  assert_eq!(store.applied, 4);
  assert_eq!(forge.metrics().applied, 4);
  assert_eq!(forge.live_count(), 4);
  // Two results landed together on tick 2, so the backlog takes extra ticks
  assert!(ticks >= 5);
}

#[test]
fn test_first_tick_dispatches_without_applying() {
  let mut forge = inline_forge(1);
  let mut store = MeshStore::new();
  forge.add_task(Task::Build(task_at(0, 3)));

  assert_eq!(forge.update(&mut store), None);
  assert_eq!(forge.queued(), 0);
  assert_eq!(forge.in_flight(), 1);

  let applied = forge.update(&mut store).unwrap();
  assert_eq!(forge.in_flight(), 0);
  assert!(store.get(applied.resource).is_some());
}

#[test]
fn test_shallow_chunks_are_applied_first() {
  let mut forge = inline_forge(1);
  let mut store = MeshStore::new();
  let deep = task_at(3, 3);
  let mid = task_at(2, 3);
  let shallow = task_at(1, 3);
  forge.add_task(Task::Build(deep.clone()));
  forge.add_task(Task::Build(mid.clone()));
  forge.add_task(Task::Build(shallow.clone()));

  let order: Vec<_> = run_until_idle(&mut forge, &mut store)
    .into_iter()
    .map(|chunk| chunk.id)
    .collect();
  assert_eq!(order, vec![shallow.id, mid.id, deep.id]);
}

#[test]
fn test_result_for_disposed_chunk_is_discarded() {
  let mut forge = inline_forge(1);
  let mut store = MeshStore::new();
  let task = task_at(1, 3);
  let id = task.id;
  forge.add_task(Task::Build(task));

  forge.update(&mut store);
  assert_eq!(forge.in_flight(), 1);

  forge.add_task(delete(id));
  assert_eq!(forge.update(&mut store), None);
  assert_eq!(forge.metrics().discarded, 1);
  assert!(store.is_empty());
  assert!(!forge.is_live(id));
  assert!(forge.is_idle());
}

#[test]
fn test_discard_moves_on_to_next_result() {
  let mut forge = inline_forge(2);
  let mut store = MeshStore::new();
  let doomed = task_at(1, 3);
  let kept = task_at(1, 3);
  let doomed_id = doomed.id;
  forge.add_task(Task::Build(doomed));
  forge.add_task(Task::Build(kept.clone()));

  forge.update(&mut store);
  forge.add_task(delete(doomed_id));
  let applied = forge.update(&mut store).unwrap();
  assert_eq!(applied.id, kept.id);
}

#[test]
fn test_deletion_cancels_queued_build() {
  let mut forge = inline_forge(1);
  let mut store = MeshStore::new();
  let first = task_at(1, 3);
  let second = task_at(2, 3);
  let second_id = second.id;
  forge.add_task(Task::Build(first.clone()));
  forge.add_task(Task::Build(second));

  forge.update(&mut store);
  forge.add_task(delete(second_id));
  assert_eq!(forge.metrics().cancelled, 1);

  let applied = run_until_idle(&mut forge, &mut store);
  assert_eq!(applied.len(), 1);
  assert_eq!(applied[0].id, first.id);
  assert_eq!(forge.metrics().dispatched, 1);
}

#[test]
fn test_deleting_applied_chunk_releases_once() {
  let mut forge = inline_forge(1);
  let mut store = MeshStore::new();
  let task = task_at(0, 3);
  let id = task.id;
  forge.add_task(Task::Build(task));
  let applied = run_until_idle(&mut forge, &mut store);
  assert_eq!(applied.len(), 1);

  let resource = applied[0].resource;
  forge.add_task(Task::Delete(DeletionTask {
    id,
    mesh: MeshHandle::Ready(resource),
  }));
  forge.add_task(Task::Delete(DeletionTask {
    id,
    mesh: MeshHandle::Ready(resource),
  }));
  forge.update(&mut store);

  assert_eq!(store.released, 1);
  assert!(store.is_empty());
  assert_eq!(forge.live_count(), 0);
  assert_eq!(forge.metrics().released, 1);
}

#[test]
fn test_reset_discards_stale_results_and_queue() {
  let mut forge = inline_forge(1);
  let mut store = MeshStore::new();
  forge.add_task(Task::Build(task_at(1, 3)));
  forge.add_task(Task::Build(task_at(2, 3)));

  forge.update(&mut store);
  forge.reset();
  assert_eq!(forge.epoch(), Epoch(1));
  assert_eq!(forge.queued(), 0);
  assert_eq!(forge.metrics().cancelled, 1);

  assert_eq!(forge.update(&mut store), None);
  assert_eq!(forge.metrics().discarded, 1);
  assert!(forge.is_idle());

  // New work after the reset applies normally
  forge.add_task(Task::Build(task_at(0, 3)));
  assert_eq!(run_until_idle(&mut forge, &mut store).len(), 1);
}

#[test]
fn test_panicking_build_is_fatal_to_that_task_only() {
  let mut forge = inline_forge(1);
  let mut store = MeshStore::new();
  let broken = task_at(1, 1);
  let healthy = task_at(2, 3);
  forge.add_task(Task::Build(broken));
  forge.add_task(Task::Build(healthy.clone()));

  let applied = run_until_idle(&mut forge, &mut store);
  assert_eq!(forge.metrics().failed, 1);
  assert_eq!(applied.len(), 1);
  assert_eq!(applied[0].id, healthy.id);
  assert_eq!(forge.worker_count(), 1);
}

#[test]
fn test_threaded_forge_drains_backlog_within_worker_bound() {
  let mut forge = ChunkForge::new(&ForgeConfig::threaded(3)).unwrap();
  let mut store = MeshStore::new();
  for i in 0..20 {
    forge.add_task(Task::Build(task_at(i % 5, 9)));
  }

  for _ in 0..10_000 {
    forge.update(&mut store);
    assert!(forge.pool().running() <= 3);
    if forge.is_idle() {
      break;
    }
    std::thread::sleep(Duration::from_millis(1));
  }

  assert!(forge.is_idle());
  assert_eq!(store.applied, 20);
  assert!(forge.metrics().peak_concurrent <= 3);
  assert_eq!(forge.metrics().build_timings.len(), 20);
}

#[test]
fn test_rejects_zero_workers() {
  let config = ForgeConfig {
    worker_count: Some(0),
    ..Default::default()
  };
  assert!(matches!(
    ChunkForge::new(&config),
    Err(TerrainError::Config(crate::error::ConfigError::WorkerCount))
  ));
}
