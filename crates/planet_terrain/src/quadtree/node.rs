//! Owned quadtree nodes.

use std::array;

use glam::DVec2;

use super::chunk::{ChunkId, PlanetChunk};
use super::path::{child_index_of, QuadtreePath};

/// A node is exactly one of leaf or branch; a branch always has four
/// children.
#[derive(Clone, Debug, PartialEq)]
pub enum QuadtreeNode {
  Leaf(PlanetChunk),
  Branch(Box<[QuadtreeNode; 4]>),
}

impl QuadtreeNode {
  /// Branch of four leaves produced by `make`.
  pub fn branch_from(mut make: impl FnMut(u8) -> PlanetChunk) -> Self {
    QuadtreeNode::Branch(Box::new(array::from_fn(|i| {
      QuadtreeNode::Leaf(make(i as u8))
    })))
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    matches!(self, QuadtreeNode::Leaf(_))
  }

  pub fn as_leaf(&self) -> Option<&PlanetChunk> {
    match self {
      QuadtreeNode::Leaf(chunk) => Some(chunk),
      QuadtreeNode::Branch(_) => None,
    }
  }

  /// Visit every leaf chunk, depth first, children in index order.
  pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a PlanetChunk)) {
    match self {
      QuadtreeNode::Leaf(chunk) => f(chunk),
      QuadtreeNode::Branch(children) => {
        for child in children.iter() {
          child.for_each_leaf(f);
        }
      }
    }
  }

  /// Move every chunk out of the subtree.
  pub fn into_chunks(self, out: &mut Vec<PlanetChunk>) {
    match self {
      QuadtreeNode::Leaf(chunk) => out.push(chunk),
      QuadtreeNode::Branch(children) => {
        let children: [QuadtreeNode; 4] = *children;
        for child in children {
          child.into_chunks(out);
        }
      }
    }
  }

  pub fn leaf_count(&self) -> usize {
    match self {
      QuadtreeNode::Leaf(_) => 1,
      QuadtreeNode::Branch(children) => children.iter().map(QuadtreeNode::leaf_count).sum(),
    }
  }

  /// Deepest leaf depth in the subtree.
  pub fn max_depth(&self) -> u32 {
    match self {
      QuadtreeNode::Leaf(chunk) => chunk.depth(),
      QuadtreeNode::Branch(children) => children
        .iter()
        .map(QuadtreeNode::max_depth)
        .max()
        .unwrap_or_default(),
    }
  }

  /// Mean of the children's averages, recursively. Leaves without a known
  /// height are left out.
  pub fn average_height(&self) -> Option<f64> {
    match self {
      QuadtreeNode::Leaf(chunk) => chunk.average_height,
      QuadtreeNode::Branch(children) => {
        let known: Vec<f64> = children.iter().filter_map(QuadtreeNode::average_height).collect();
        if known.is_empty() {
          None
        } else {
          Some(known.iter().sum::<f64>() / known.len() as f64)
        }
      }
    }
  }

  pub fn min_average_height(&self) -> Option<f64> {
    self.fold_heights(f64::min)
  }

  pub fn max_average_height(&self) -> Option<f64> {
    self.fold_heights(f64::max)
  }

  fn fold_heights(&self, pick: fn(f64, f64) -> f64) -> Option<f64> {
    let mut acc: Option<f64> = None;
    self.for_each_leaf(&mut |chunk| {
      if let Some(h) = chunk.average_height {
        acc = Some(acc.map_or(h, |a| pick(a, h)));
      }
    });
    acc
  }

  /// Leaf holding `id`, following its path from this node (the face root).
  pub fn find(&self, id: ChunkId) -> Option<&PlanetChunk> {
    let mut node = self;
    for index in id.path.iter() {
      match node {
        QuadtreeNode::Branch(children) => node = &children[index as usize],
        QuadtreeNode::Leaf(_) => return None,
      }
    }
    node.as_leaf().filter(|chunk| chunk.id == id)
  }

  pub fn find_mut(&mut self, id: ChunkId) -> Option<&mut PlanetChunk> {
    let mut node = self;
    for index in id.path.iter() {
      match node {
        QuadtreeNode::Branch(children) => node = &mut children[index as usize],
        QuadtreeNode::Leaf(_) => return None,
      }
    }
    match node {
      QuadtreeNode::Leaf(chunk) if chunk.id == id => Some(chunk),
      _ => None,
    }
  }

  /// Leaf covering plane-space point `point` on a face of side `root_length`.
  pub fn leaf_at(&self, point: DVec2, root_length: f64) -> &PlanetChunk {
    let mut node = self;
    let mut path = QuadtreePath::ROOT;
    loop {
      match node {
        QuadtreeNode::Leaf(chunk) => return chunk,
        QuadtreeNode::Branch(children) => {
          let index = child_index_of(point - path.plane_position(root_length));
          path = path.child(index);
          node = &children[index as usize];
        }
      }
    }
  }
}
