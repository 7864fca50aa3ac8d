//! Cube face directions and their fixed rotations.
//!
//! Every face is generated in the plane `z = -L/2` (the Forward face) and then
//! rotated into place. Rotations are proper (det = +1), so triangle winding is
//! preserved across all six faces.

use std::fmt;

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

/// Face of the logical cube a quadtree belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
  Up,
  Down,
  Forward,
  Backward,
  Left,
  Right,
}

impl Direction {
  /// All six faces in a stable order.
  pub const ALL: [Direction; 6] = [
    Direction::Up,
    Direction::Down,
    Direction::Forward,
    Direction::Backward,
    Direction::Left,
    Direction::Right,
  ];

  /// Stable index in `ALL`.
  #[inline]
  pub fn index(self) -> usize {
    self as usize
  }

  /// Rotation taking plane space (face at `z = -L/2`) into cube space.
  pub fn rotation(self) -> DMat3 {
    use std::f64::consts::{FRAC_PI_2, PI};
    match self {
      Direction::Up => DMat3::from_rotation_x(FRAC_PI_2),
      Direction::Down => DMat3::from_rotation_x(-FRAC_PI_2),
      Direction::Forward => DMat3::IDENTITY,
      Direction::Backward => DMat3::from_rotation_y(PI),
      Direction::Left => DMat3::from_rotation_y(FRAC_PI_2),
      Direction::Right => DMat3::from_rotation_y(-FRAC_PI_2),
    }
  }

  /// Outward unit normal of the face in cube space.
  pub fn normal(self) -> DVec3 {
    match self {
      Direction::Up => DVec3::Y,
      Direction::Down => DVec3::NEG_Y,
      Direction::Forward => DVec3::NEG_Z,
      Direction::Backward => DVec3::Z,
      Direction::Left => DVec3::NEG_X,
      Direction::Right => DVec3::X,
    }
  }

  /// Face whose normal is closest to `v` (cube-space direction).
  pub fn dominant(v: DVec3) -> Direction {
    let mut best = Direction::Forward;
    let mut best_dot = f64::NEG_INFINITY;
    for direction in Self::ALL {
      let dot = direction.normal().dot(v);
      if dot > best_dot {
        best_dot = dot;
        best = direction;
      }
    }
    best
  }
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.index())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rotation_maps_forward_plane_onto_face_normal() {
    for direction in Direction::ALL {
      let mapped = direction.rotation() * DVec3::NEG_Z;
      assert!(
        (mapped - direction.normal()).length() < 1e-12,
        "{:?} maps -Z to {:?}",
        direction,
        mapped
      );
    }
  }

  #[test]
  fn rotations_are_proper() {
    for direction in Direction::ALL {
      assert!((direction.rotation().determinant() - 1.0).abs() < 1e-12);
    }
  }

  #[test]
  fn dominant_picks_the_face_under_a_point() {
    assert_eq!(Direction::dominant(DVec3::new(0.1, 0.9, 0.2)), Direction::Up);
    assert_eq!(Direction::dominant(DVec3::new(-3.0, 1.0, 0.0)), Direction::Left);
    assert_eq!(Direction::dominant(DVec3::new(0.0, 0.0, 5.0)), Direction::Backward);
  }

  #[test]
  fn index_matches_all_order() {
    for (i, direction) in Direction::ALL.iter().enumerate() {
      assert_eq!(direction.index(), i);
    }
  }
}
