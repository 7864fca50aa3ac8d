//! Root-to-node paths packed two bits per level.
//!
//! ```text
//! child index layout (plane space, looking at the face from outside)
//!
//!   +y ┌─────┬─────┐
//!      │  3  │  2  │
//!      ├─────┼─────┤
//!      │  0  │  1  │
//!   -y └─────┴─────┘
//!     -x           +x
//! ```
//!
//! Level `i` (0 = first step below the root) is stored in bits `2i..2i+2`.

use std::fmt;

use glam::{DVec2, DVec3};

use crate::error::TerrainError;

/// Position of a node inside one face quadtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuadtreePath {
  bits: u64,
  depth: u8,
}

impl QuadtreePath {
  /// Deepest path that fits in the packed representation.
  pub const MAX_DEPTH: u32 = 32;

  /// The face root (empty path).
  pub const ROOT: Self = Self { bits: 0, depth: 0 };

  #[inline]
  pub fn root() -> Self {
    Self::ROOT
  }

  /// Build a path from explicit child indices.
  pub fn from_indices(indices: &[u8]) -> Result<Self, TerrainError> {
    indices
      .iter()
      .try_fold(Self::ROOT, |path, &index| path.try_child(index))
  }

  #[inline]
  pub fn depth(self) -> u32 {
    self.depth as u32
  }

  #[inline]
  pub fn is_root(self) -> bool {
    self.depth == 0
  }

  /// Child index at `level`, if the path is that deep.
  #[inline]
  pub fn get(self, level: u32) -> Option<u8> {
    if level < self.depth() {
      Some(((self.bits >> (2 * level)) & 0b11) as u8)
    } else {
      None
    }
  }

  /// Index of this node within its parent.
  #[inline]
  pub fn last(self) -> Option<u8> {
    self.depth().checked_sub(1).and_then(|level| self.get(level))
  }

  /// Child indices from the root down.
  pub fn iter(self) -> impl Iterator<Item = u8> {
    (0..self.depth()).filter_map(move |level| self.get(level))
  }

  /// Append `index` (0..=3).
  ///
  /// # Panics
  ///
  /// If `index > 3` or the path is already `MAX_DEPTH` deep.
  #[inline]
  pub fn child(self, index: u8) -> Self {
    assert!(index < 4, "quadtree child index {} out of range", index);
    assert!(self.depth() < Self::MAX_DEPTH, "quadtree path too deep");
    Self {
      bits: self.bits | ((index as u64) << (2 * self.depth as u64)),
      depth: self.depth + 1,
    }
  }

  /// Fallible `child` for indices coming from outside the crate.
  pub fn try_child(self, index: u8) -> Result<Self, TerrainError> {
    if index > 3 {
      return Err(TerrainError::InvalidChildIndex(index));
    }
    if self.depth() >= Self::MAX_DEPTH {
      return Err(TerrainError::PathTooDeep {
        max: Self::MAX_DEPTH,
      });
    }
    Ok(self.child(index))
  }

  pub fn parent(self) -> Option<Self> {
    if self.is_root() {
      return None;
    }
    let depth = self.depth - 1;
    let mask = (1u64 << (2 * depth as u64)) - 1;
    Some(Self {
      bits: self.bits & mask,
      depth,
    })
  }

  /// True if `self` is `other` or lies on the way from the root to it.
  pub fn is_ancestor_of(self, other: Self) -> bool {
    if self.depth > other.depth {
      return false;
    }
    // depth 32 fills all 64 bits
    let mask = if self.depth() == Self::MAX_DEPTH {
      u64::MAX
    } else {
      (1u64 << (2 * self.depth as u64)) - 1
    };
    other.bits & mask == self.bits
  }

  /// Side length of the node for a root face of side `root_length`.
  #[inline]
  pub fn size(self, root_length: f64) -> f64 {
    root_length / (1u64 << self.depth()) as f64
  }

  /// Node center in plane space (face centered at the origin).
  pub fn plane_position(self, root_length: f64) -> DVec2 {
    let mut position = DVec2::ZERO;
    let mut offset = root_length / 4.0;
    for index in self.iter() {
      position += child_sign(index) * offset;
      offset /= 2.0;
    }
    position
  }

  /// Node center on the Forward cube face, before the face rotation.
  #[inline]
  pub fn cube_position(self, root_length: f64) -> DVec3 {
    self.plane_position(root_length).extend(-root_length / 2.0)
  }
}

/// Quadrant signs of a child relative to its parent's center.
#[inline]
pub fn child_sign(index: u8) -> DVec2 {
  match index {
    0 => DVec2::new(-1.0, -1.0),
    1 => DVec2::new(1.0, -1.0),
    2 => DVec2::new(1.0, 1.0),
    _ => DVec2::new(-1.0, 1.0),
  }
}

/// Child index of the quadrant containing `offset` (relative to the parent
/// center). Points on an axis go to the positive side.
#[inline]
pub fn child_index_of(offset: DVec2) -> u8 {
  match (offset.x >= 0.0, offset.y >= 0.0) {
    (false, false) => 0,
    (true, false) => 1,
    (true, true) => 2,
    (false, true) => 3,
  }
}

impl fmt::Display for QuadtreePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_root() {
      return write!(f, "root");
    }
    for index in self.iter() {
      write!(f, "{}", index)?;
    }
    Ok(())
  }
}

#[cfg(test)]
#[path = "path_test.rs"]
mod path_test;
