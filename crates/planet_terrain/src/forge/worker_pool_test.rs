use super::*;

use std::time::Duration;

use crate::direction::Direction;
use crate::planet::PlanetId;
use crate::quadtree::QuadtreePath;
use crate::terrain::TerrainSettings;

fn task_at(depth: u32, vertices_per_row: usize) -> BuildTask {
  let path = QuadtreePath::from_indices(&vec![0; depth as usize]).unwrap();
  BuildTask {
    id: ChunkId::new(PlanetId::new(), Direction::Forward, path),
    direction: Direction::Forward,
    depth,
    position: path.cube_position(10.0),
    chunk_length: path.size(10.0),
    vertices_per_row,
    terrain: Arc::new(TerrainSettings::flat()),
    seed: 0,
  }
}

fn inline_pool(workers: usize) -> WorkerPool {
  WorkerPool::new(&ForgeConfig::inline(workers)).unwrap()
}

#[test]
fn test_shallower_tasks_pop_first() {
  let mut pool = inline_pool(1);
  let deep = task_at(3, 3);
  let shallow = task_at(1, 3);
  let mid = task_at(2, 3);
  pool.submit_task(deep.clone());
  pool.submit_task(shallow.clone());
  pool.submit_task(mid.clone());

  assert_eq!(pool.next_task().unwrap().id, shallow.id);
  assert_eq!(pool.next_task().unwrap().id, mid.id);
  assert_eq!(pool.next_task().unwrap().id, deep.id);
  assert!(!pool.has_task());
}

#[test]
fn test_equal_depth_is_fifo() {
  let mut pool = inline_pool(1);
  let tasks: Vec<_> = (0..5).map(|_| task_at(2, 3)).collect();
  for task in &tasks {
    pool.submit_task(task.clone());
  }
  for task in &tasks {
    assert_eq!(pool.next_task().unwrap().id, task.id);
  }
}

#[test]
fn test_cancel_removes_queued_task() {
  let mut pool = inline_pool(1);
  let a = task_at(1, 3);
  let b = task_at(1, 3);
  pool.submit_task(a.clone());
  pool.submit_task(b.clone());

  assert!(pool.cancel(a.id));
  assert!(!pool.cancel(a.id));
  assert_eq!(pool.queued_len(), 1);
  assert_eq!(pool.next_task().unwrap().id, b.id);
}

#[test]
fn test_worker_lifecycle() {
  let mut pool = inline_pool(2);
  assert_eq!(pool.worker_count(), 2);
  assert_eq!(pool.available().len(), 2);

  pool.submit_task(task_at(0, 3));
  let (worker, _) = pool.dispatch_next(Epoch::new()).unwrap();
  assert_eq!(pool.busy(), &[worker]);
  assert_eq!(pool.available().len(), 1);

  // Nothing else queued: the worker finishes
  let messages = pool.drain();
  assert_eq!(messages.len(), 1);
  assert_eq!(messages[0].worker(), worker);
  assert_eq!(pool.complete(worker, Epoch::new()), None);
  assert_eq!(pool.finished(), &[worker]);
  assert!(pool.busy().is_empty());

  pool.recycle_finished();
  assert_eq!(pool.available().len(), 2);
  assert!(pool.finished().is_empty());
  assert_eq!(pool.worker_count(), 2);
}

#[test]
fn test_completion_redispatches_same_worker() {
  let mut pool = inline_pool(1);
  let first = task_at(0, 3);
  let second = task_at(1, 3);
  pool.submit_task(first);
  pool.submit_task(second.clone());

  let (worker, _) = pool.dispatch_next(Epoch::new()).unwrap();
  assert!(pool.dispatch_next(Epoch::new()).is_none(), "only one worker");

  assert_eq!(pool.drain().len(), 1);
  assert_eq!(pool.complete(worker, Epoch::new()), Some(second.id));
  assert_eq!(pool.busy(), &[worker]);
  assert!(pool.finished().is_empty());
}

#[test]
fn test_panicking_build_reports_failure() {
  let mut pool = inline_pool(1);
  let broken = task_at(0, 1);
  pool.submit_task(broken.clone());
  pool.dispatch_next(Epoch::new()).unwrap();

  let messages = pool.drain();
  assert!(matches!(
    messages.as_slice(),
    [WorkerMessage::Failed { chunk, .. }] if *chunk == broken.id
  ));
  assert_eq!(pool.running(), 0);
}

#[test]
fn test_results_carry_dispatch_epoch() {
  let mut pool = inline_pool(1);
  pool.submit_task(task_at(0, 3));
  pool.dispatch_next(Epoch(7)).unwrap();
  match pool.drain().pop() {
    Some(WorkerMessage::Built { result, .. }) => assert_eq!(result.epoch, Epoch(7)),
    other => panic!("unexpected message {:?}", other),
  }
}

#[test]
fn test_threaded_pool_never_exceeds_worker_count() {
  let mut pool = WorkerPool::new(&ForgeConfig::threaded(2)).unwrap();
  for i in 0..24 {
    pool.submit_task(task_at(i % 4, 17));
  }

  let mut completed = 0;
  for _ in 0..5000 {
    pool.recycle_finished();
    while pool.dispatch_next(Epoch::new()).is_some() {}
    assert!(pool.busy().len() <= 2);

    for message in pool.drain() {
      assert!(matches!(message, WorkerMessage::Built { .. }));
      completed += 1;
      pool.complete(message.worker(), Epoch::new());
    }
    if completed == 24 {
      break;
    }
    std::thread::sleep(Duration::from_millis(1));
  }

  assert_eq!(completed, 24);
  assert!(pool.peak_concurrent() >= 1);
  assert!(pool.peak_concurrent() <= 2);
}
