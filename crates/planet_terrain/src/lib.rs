//! planet_terrain - engine independent LOD terrain for cube-sphere planets
//!
//! A planet is a cube whose six faces each own a quadtree. Leaves near the
//! observer split, distant branches merge back, and every leaf is tessellated
//! into a chunk mesh displaced by a layered height field (noise octaves plus
//! crater stamping). Mesh builds run on a bounded worker pool; finished
//! meshes are applied one per tick so terrain generation never spikes frame
//! time.
//!
//! # Features
//!
//! - **Quadtree LOD**: distance-driven split/merge with a min-depth floor and
//!   optional merge hysteresis
//! - **Deterministic meshing**: identical inputs give bit-identical buffers,
//!   shared edges of neighbouring chunks line up
//! - **Chunk forge**: priority queue (coarse first), epoch-tagged results,
//!   queue-time cancellation and apply-time disposal checks
//! - **Deferred deletion**: replaced chunks stay visible until their
//!   replacements are applied
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use planet_terrain::{ChunkForge, ForgeConfig, MeshStore, Observer, Planet, PlanetConfig, TerrainSettings};
//!
//! let mut forge = ChunkForge::new(&ForgeConfig::default())?;
//! let mut store = MeshStore::new();
//! let mut planet = Planet::new(PlanetConfig::default(), Arc::new(TerrainSettings::default()), &mut forge)?;
//!
//! loop {
//!   planet.update_lod(&Observer::looking_at_origin(camera), &mut forge);
//!   if let Some(applied) = forge.update(&mut store) {
//!     planet.record_applied(&applied);
//!   }
//! }
//! ```

pub mod config;
pub mod constants;
pub mod direction;
pub mod error;

// Re-export commonly used items
pub use config::{Execution, ForgeConfig, PlanetConfig};
pub use direction::Direction;
pub use error::{ConfigError, TerrainError};

// Height field: noise layers and craters
pub mod terrain;
pub use terrain::{Crater, CraterField, HeightField, TerrainSettings};

// Chunk tessellation
pub mod mesh;
pub use mesh::ChunkMesh;

// Per-face LOD quadtrees
pub mod quadtree;
pub use quadtree::{ChunkId, LodStats, MeshHandle, PlanetChunk, PlanetSide, QuadtreeNode, QuadtreePath};

// Worker pool and per-tick apply queue
pub mod forge;
pub use forge::{AppliedChunk, ChunkForge, MeshSink, MeshStore, ResourceId, Task, TaskSink};

// Six faces + transform + terrain snapshot
pub mod planet;
pub use planet::{Observer, Planet, PlanetId};

pub mod metrics;
pub use metrics::{ForgeMetrics, RollingWindow};
