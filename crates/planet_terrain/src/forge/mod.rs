//! Chunk forge: bounded parallel mesh building with a per-tick apply budget.
//!
//! Quadtrees emit `Task`s through the `TaskSink` trait. The forge queues
//! builds by depth, runs them on its `WorkerPool`, and hands one finished
//! mesh per `update` to the caller's `MeshSink`.

pub mod chunk_forge;
pub mod sink;
pub mod task;
pub mod worker_pool;

pub use chunk_forge::{AppliedChunk, ChunkForge};
pub use sink::{MeshSink, MeshStore, ResourceId};
pub use task::{BuildResult, BuildTask, DeletionTask, Epoch, Task, TaskSink};
pub use worker_pool::{WorkerId, WorkerMessage, WorkerPool};
