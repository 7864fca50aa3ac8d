//! Renderer boundary.
//!
//! The forge never touches a GPU. Finished meshes go to a `MeshSink`, which
//! hands back an opaque `ResourceId`; the same id comes back on release.

use std::collections::HashMap;

use crate::mesh::ChunkMesh;
use crate::quadtree::ChunkId;

/// Opaque renderer resource handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

/// Owner of renderable meshes.
///
/// `ChunkId::planet` identifies the parent transform; `ChunkMesh::origin`
/// is the chunk's placement in that planet's space.
pub trait MeshSink {
  /// Create a renderable mesh for `chunk`.
  fn apply(&mut self, chunk: ChunkId, mesh: &ChunkMesh) -> ResourceId;

  /// Free the resource created by an earlier `apply`.
  fn release(&mut self, chunk: ChunkId, resource: ResourceId);
}

/// In-memory sink that keeps every applied mesh.
#[derive(Debug, Default)]
pub struct MeshStore {
  meshes: HashMap<ResourceId, (ChunkId, ChunkMesh)>,
  next: u64,
  pub applied: u64,
  pub released: u64,
}

impl MeshStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.meshes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.meshes.is_empty()
  }

  pub fn get(&self, resource: ResourceId) -> Option<&ChunkMesh> {
    self.meshes.get(&resource).map(|(_, mesh)| mesh)
  }

  pub fn contains_chunk(&self, chunk: ChunkId) -> bool {
    self.meshes.values().any(|(id, _)| *id == chunk)
  }

  pub fn iter(&self) -> impl Iterator<Item = (ChunkId, &ChunkMesh)> {
    self.meshes.values().map(|(id, mesh)| (*id, mesh))
  }

  /// Total triangles across live meshes.
  pub fn triangle_count(&self) -> usize {
    self.meshes.values().map(|(_, mesh)| mesh.triangle_count()).sum()
  }

  /// Approximate heap footprint of live mesh buffers.
  pub fn byte_size(&self) -> usize {
    self.meshes.values().map(|(_, mesh)| mesh.byte_size()).sum()
  }
}

impl MeshSink for MeshStore {
  fn apply(&mut self, chunk: ChunkId, mesh: &ChunkMesh) -> ResourceId {
    let resource = ResourceId(self.next);
    self.next += 1;
    self.applied += 1;
    self.meshes.insert(resource, (chunk, mesh.clone()));
    resource
  }

  fn release(&mut self, chunk: ChunkId, resource: ResourceId) {
    match self.meshes.remove(&resource) {
      Some((owner, _)) if owner == chunk => self.released += 1,
      Some(entry) => {
        tracing::warn!(%chunk, owner = %entry.0, "release for a resource owned by another chunk");
        self.meshes.insert(resource, entry);
      }
      None => tracing::warn!(%chunk, ?resource, "release for an unknown resource"),
    }
  }
}
