//! Procedural height field for planet surfaces.
//!
//! ```text
//!   TerrainSettings (immutable snapshot, shared via Arc)
//!          │
//!          ▼
//!   HeightField::new(&settings, seed, radius)
//!          │
//!          ├── CraterField    → radial depressions, summed
//!          ├── continents ─┐
//!          ├── mountains ──┴─ product × mountain_height × strength
//!          └── bumps         → small-scale roughness
//! ```
//!
//! The height field holds no mutable state. Two builders evaluating the same
//! point with the same snapshot and seed get the same bits back.

pub mod crater;
pub mod height_field;
pub mod noise_layer;
pub mod settings;

pub use crater::{Crater, CraterField};
pub use height_field::HeightField;
pub use noise_layer::NoiseLayer;
pub use settings::{
  CraterModifiers, NoiseKind, NoiseLayerSettings, NoiseModifiers, ScatterSettings, TerrainSettings,
};
