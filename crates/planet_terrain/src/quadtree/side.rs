//! One cube face of a planet and its LOD quadtree.
//!
//! ```text
//! update_lod(observer):
//!   for node at path P (d = |world(P) - observer|, limit = k * L / 2^depth):
//!
//!     split = (d < limit && depth < max_depth) || depth < min_depth
//!
//!     Leaf   + split  → Branch of 4 new leaves (4 builds), retire old leaf
//!     Branch + split  → recurse
//!     Branch + !split → depth >= min_depth && d >= limit * hysteresis
//!                         ? new Leaf (1 build), retire every chunk below
//!                         : recurse
//!     Leaf   + !split → unchanged
//! ```
//!
//! A leaf splits one level per call. Restructuring happens in place through
//! `&mut QuadtreeNode` and `mem::replace`, so a node is never observed as both
//! (or neither) leaf and branch.

use std::sync::Arc;

use glam::{DAffine3, DVec2, DVec3};
use smallvec::{smallvec, SmallVec};

use crate::config::PlanetConfig;
use crate::direction::Direction;
use crate::forge::{DeletionTask, ResourceId, Task, TaskSink};
use crate::planet::PlanetId;
use crate::terrain::TerrainSettings;

use super::chunk::{ChunkId, MeshHandle, PlanetChunk};
use super::node::QuadtreeNode;
use super::path::QuadtreePath;
use super::semaphore::DeleteSemaphore;

/// Shared inputs of one LOD pass.
#[derive(Clone, Copy, Debug)]
pub struct LodContext<'a> {
  pub config: &'a PlanetConfig,
  pub terrain: &'a Arc<TerrainSettings>,
  /// Planet-to-world transform.
  pub transform: &'a DAffine3,
}

/// What one `update_lod` call changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LodStats {
  pub splits: usize,
  pub merges: usize,
  pub builds_issued: usize,
  pub deletions_issued: usize,
  /// Chunks parked behind a delete semaphore.
  pub deferred: usize,
}

impl LodStats {
  pub fn is_unchanged(&self) -> bool {
    self.splits == 0 && self.merges == 0 && self.deletions_issued == 0
  }
}

impl std::ops::AddAssign for LodStats {
  fn add_assign(&mut self, other: Self) {
    self.splits += other.splits;
    self.merges += other.merges;
    self.builds_issued += other.builds_issued;
    self.deletions_issued += other.deletions_issued;
    self.deferred += other.deferred;
  }
}

/// Quadtree of one cube face.
#[derive(Debug)]
pub struct PlanetSide {
  planet: PlanetId,
  direction: Direction,
  root: QuadtreeNode,
  semaphores: Vec<DeleteSemaphore>,
}

impl PlanetSide {
  /// Seed the face with a single root leaf and request its build.
  pub fn new(
    planet: PlanetId,
    direction: Direction,
    ctx: &LodContext<'_>,
    tasks: &mut impl TaskSink,
  ) -> Self {
    let root = spawn_chunk(planet, direction, QuadtreePath::ROOT, ctx, tasks);
    Self {
      planet,
      direction,
      root: QuadtreeNode::Leaf(root),
      semaphores: Vec::new(),
    }
  }

  #[inline]
  pub fn direction(&self) -> Direction {
    self.direction
  }

  pub fn root(&self) -> &QuadtreeNode {
    &self.root
  }

  /// Delete semaphores still waiting.
  pub fn pending_semaphores(&self) -> &[DeleteSemaphore] {
    &self.semaphores
  }

  /// Restructure the tree around `observer` (world space).
  #[cfg_attr(
    feature = "profiling",
    tracing::instrument(skip_all, name = "quadtree::update_lod", fields(direction = ?self.direction))
  )]
  pub fn update_lod(
    &mut self,
    observer: DVec3,
    ctx: &LodContext<'_>,
    tasks: &mut impl TaskSink,
  ) -> LodStats {
    let mut walker = LodWalker {
      planet: self.planet,
      direction: self.direction,
      observer,
      ctx,
      tasks,
      stats: LodStats::default(),
      parked: Vec::new(),
    };

    // Semaphores first, against the tree as the renderer currently sees it
    let root = &self.root;
    let (resolved, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.semaphores)
      .into_iter()
      .partition(|semaphore| semaphore.is_resolved(root));
    for semaphore in resolved {
      walker.stats.deletions_issued += semaphore.release(walker.tasks);
    }

    walker.visit(&mut self.root, QuadtreePath::ROOT);

    let LodWalker { stats, parked, .. } = walker;
    self.semaphores = waiting;
    self.semaphores.extend(parked);
    stats
  }

  /// Write the applied resource into the chunk. Returns `false` if the chunk
  /// is no longer in the tree.
  pub fn record_applied(&mut self, id: ChunkId, resource: ResourceId, average_height: f64) -> bool {
    match self.root.find_mut(id) {
      Some(chunk) => {
        chunk.mesh = MeshHandle::Ready(resource);
        chunk.average_height = Some(average_height);
        true
      }
      None => false,
    }
  }

  pub fn find(&self, id: ChunkId) -> Option<&PlanetChunk> {
    self.root.find(id)
  }

  pub fn for_each_chunk<'a>(&'a self, mut f: impl FnMut(&'a PlanetChunk)) {
    self.root.for_each_leaf(&mut f);
  }

  pub fn chunks(&self) -> Vec<&PlanetChunk> {
    let mut chunks = Vec::new();
    self.root.for_each_leaf(&mut |chunk| chunks.push(chunk));
    chunks
  }

  pub fn leaf_count(&self) -> usize {
    self.root.leaf_count()
  }

  pub fn max_leaf_depth(&self) -> u32 {
    self.root.max_depth()
  }

  pub fn average_height(&self) -> Option<f64> {
    self.root.average_height()
  }

  pub fn min_average_height(&self) -> Option<f64> {
    self.root.min_average_height()
  }

  pub fn max_average_height(&self) -> Option<f64> {
    self.root.max_average_height()
  }

  /// Leaf covering plane-space `(x, y)` on this face.
  pub fn leaf_at_plane(&self, x: f64, y: f64, root_length: f64) -> &PlanetChunk {
    self.root.leaf_at(DVec2::new(x, y), root_length)
  }

  /// Drop the whole tree and reseed the root leaf.
  pub fn reset(&mut self, ctx: &LodContext<'_>, tasks: &mut impl TaskSink) -> LodStats {
    let root = spawn_chunk(self.planet, self.direction, QuadtreePath::ROOT, ctx, tasks);
    let old = std::mem::replace(&mut self.root, QuadtreeNode::Leaf(root));
    let semaphores = std::mem::take(&mut self.semaphores);
    LodStats {
      builds_issued: 1,
      deletions_issued: release_all(old, semaphores, tasks),
      ..Default::default()
    }
  }

  /// Delete every chunk, including those parked behind semaphores.
  pub fn dispose(self, tasks: &mut impl TaskSink) -> usize {
    let PlanetSide {
      root, semaphores, ..
    } = self;
    release_all(root, semaphores, tasks)
  }
}

fn release_all(
  root: QuadtreeNode,
  semaphores: Vec<DeleteSemaphore>,
  tasks: &mut impl TaskSink,
) -> usize {
  let mut chunks = Vec::new();
  root.into_chunks(&mut chunks);
  for chunk in &chunks {
    delete_chunk(chunk, tasks);
  }
  let mut deleted = chunks.len();
  for semaphore in semaphores {
    deleted += semaphore.release(tasks);
  }
  deleted
}

fn spawn_chunk(
  planet: PlanetId,
  direction: Direction,
  path: QuadtreePath,
  ctx: &LodContext<'_>,
  tasks: &mut impl TaskSink,
) -> PlanetChunk {
  let chunk = PlanetChunk::new(ChunkId::new(planet, direction, path), ctx.config.chunk_length);
  tasks.add_task(Task::Build(chunk.build_task(ctx.config, ctx.terrain)));
  chunk
}

fn delete_chunk(chunk: &PlanetChunk, tasks: &mut impl TaskSink) {
  tasks.add_task(Task::Delete(DeletionTask {
    id: chunk.id,
    mesh: chunk.mesh,
  }));
}

struct LodWalker<'c, 't, T: TaskSink> {
  planet: PlanetId,
  direction: Direction,
  observer: DVec3,
  ctx: &'c LodContext<'c>,
  tasks: &'t mut T,
  stats: LodStats,
  parked: Vec<DeleteSemaphore>,
}

impl<T: TaskSink> LodWalker<'_, '_, T> {
  fn distance_squared(&self, path: QuadtreePath) -> f64 {
    let config = self.ctx.config;
    let cube = self.direction.rotation() * path.cube_position(config.chunk_length);
    let world = self
      .ctx
      .transform
      .transform_point3(cube.normalize() * config.radius());
    world.distance_squared(self.observer)
  }

  fn visit(&mut self, node: &mut QuadtreeNode, path: QuadtreePath) {
    let config = self.ctx.config;
    let depth = path.depth();
    let d2 = self.distance_squared(path);
    let limit = config.split_limit(depth);
    let split = (d2 < limit * limit && depth < config.max_depth) || depth < config.min_depth;

    if node.is_leaf() {
      if split {
        self.split(node, path);
      }
      return;
    }

    let merge_limit = config.merge_limit(depth);
    if !split && depth >= config.min_depth && d2 >= merge_limit * merge_limit {
      self.merge(node, path);
      return;
    }

    if let QuadtreeNode::Branch(children) = node {
      for (i, child) in children.iter_mut().enumerate() {
        self.visit(child, path.child(i as u8));
      }
    }
  }

  fn split(&mut self, node: &mut QuadtreeNode, path: QuadtreePath) {
    let mut created = SmallVec::new();
    let branch = QuadtreeNode::Branch(Box::new(std::array::from_fn(|i| {
      self.grow(path.child(i as u8), &mut created)
    })));
    self.stats.builds_issued += created.len();
    self.stats.splits += 1;

    let old = std::mem::replace(node, branch);
    let mut retired = Vec::with_capacity(1);
    old.into_chunks(&mut retired);
    self.retire(retired, created);
  }

  /// New subtree at `path`: a leaf, or branches down to `min_depth` when
  /// `path` is still above the floor.
  fn grow(&mut self, path: QuadtreePath, created: &mut SmallVec<[ChunkId; 4]>) -> QuadtreeNode {
    if path.depth() < self.ctx.config.min_depth {
      return QuadtreeNode::Branch(Box::new(std::array::from_fn(|i| {
        self.grow(path.child(i as u8), created)
      })));
    }
    let chunk = spawn_chunk(self.planet, self.direction, path, self.ctx, self.tasks);
    created.push(chunk.id);
    QuadtreeNode::Leaf(chunk)
  }

  fn merge(&mut self, node: &mut QuadtreeNode, path: QuadtreePath) {
    let leaf = spawn_chunk(self.planet, self.direction, path, self.ctx, self.tasks);
    let created = smallvec![leaf.id];
    self.stats.builds_issued += 1;
    self.stats.merges += 1;

    let old = std::mem::replace(node, QuadtreeNode::Leaf(leaf));
    let mut retired = Vec::with_capacity(4);
    old.into_chunks(&mut retired);
    self.retire(retired, created);
  }

  /// Delete replaced chunks now, or park the visible ones until their
  /// replacements are applied.
  fn retire(&mut self, retired: Vec<PlanetChunk>, replacements: SmallVec<[ChunkId; 4]>) {
    if !self.ctx.config.deferred_deletion {
      for chunk in &retired {
        delete_chunk(chunk, self.tasks);
      }
      self.stats.deletions_issued += retired.len();
      return;
    }

    let (visible, unseen): (Vec<_>, Vec<_>) = retired.into_iter().partition(PlanetChunk::is_ready);
    for chunk in &unseen {
      delete_chunk(chunk, self.tasks);
    }
    self.stats.deletions_issued += unseen.len();
    if !visible.is_empty() {
      self.stats.deferred += visible.len();
      self.parked.push(DeleteSemaphore::new(replacements, visible));
    }
  }
}

#[cfg(test)]
#[path = "side_test.rs"]
mod side_test;
