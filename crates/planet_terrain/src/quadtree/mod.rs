//! Per-face LOD quadtrees.
//!
//! Each of the six cube faces owns one explicit quadtree. Leaves carry the
//! chunks that are (or will be) on screen; branches always have exactly four
//! children.
//!
//! # Module Structure
//!
//! - [`path`]: `QuadtreePath` - packed root-to-node child indices
//! - [`chunk`]: `ChunkId`, `PlanetChunk` - leaf payload and identity
//! - [`node`]: `QuadtreeNode` - owned leaf/branch tree
//! - [`semaphore`]: `DeleteSemaphore` - deferred deletion of replaced chunks
//! - [`side`]: `PlanetSide` - one face and its split/merge pass

pub mod chunk;
pub mod node;
pub mod path;
pub mod semaphore;
pub mod side;

pub use chunk::{ChunkId, MeshHandle, PlanetChunk};
pub use node::QuadtreeNode;
pub use path::{child_index_of, child_sign, QuadtreePath};
pub use semaphore::DeleteSemaphore;
pub use side::{LodContext, LodStats, PlanetSide};
