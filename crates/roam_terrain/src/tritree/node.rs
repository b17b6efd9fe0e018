//! TriTreeNode - one triangle of a binary triangle tree.
//!
//! Nodes store tree structure only, never coordinates; coordinates are
//! derived on the fly while recursing from a base triangle.

use std::mem;
use std::num::NonZeroU32;

use static_assertions::const_assert_eq;

/// Index of a node slot in a [`TriNodePool`](super::TriNodePool).
///
/// Only meaningful for the pool that issued it and only until that pool is
/// reset. Stored off-by-one so `Option<NodeId>` stays 32 bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(NonZeroU32);

const_assert_eq!(mem::size_of::<Option<NodeId>>(), mem::size_of::<u32>());

impl NodeId {
  /// `index` must be less than `u32::MAX`.
  #[inline]
  pub(crate) fn from_index(index: usize) -> Self {
    debug_assert!(index < u32::MAX as usize);
    match NonZeroU32::new(index as u32 + 1) {
      Some(raw) => Self(raw),
      None => unreachable!("index + 1 is never zero"),
    }
  }

  /// Slot index inside the pool.
  #[inline]
  pub fn index(self) -> usize {
    (self.0.get() - 1) as usize
  }
}

/// Binary triangle tree node.
///
/// ```text
///             apex
///             /|\
///   left     / | \     right
///   neighbor/  |  \neighbor
///          / L | R \
///         /    |    \
///     left ─── c ─── right
///          base neighbor
/// ```
///
/// Children are stored as a pair: a node is either a leaf or a branch, never
/// half split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriTreeNode {
  /// `(left child, right child)` when split.
  pub children: Option<(NodeId, NodeId)>,
  /// Shares this triangle's hypotenuse.
  pub base_neighbor: Option<NodeId>,
  /// Shares the apex-left leg.
  pub left_neighbor: Option<NodeId>,
  /// Shares the right-apex leg.
  pub right_neighbor: Option<NodeId>,
}

impl TriTreeNode {
  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.is_none()
  }

  #[inline]
  pub fn is_branch(&self) -> bool {
    self.children.is_some()
  }

  #[inline]
  pub fn left_child(&self) -> Option<NodeId> {
    self.children.map(|(l, _)| l)
  }

  #[inline]
  pub fn right_child(&self) -> Option<NodeId> {
    self.children.map(|(_, r)| r)
  }

  /// Repoint whichever neighbor link referenced `old` to `new`.
  ///
  /// Returns false when `old` is not a neighbor of this node.
  pub fn replace_neighbor(&mut self, old: NodeId, new: NodeId) -> bool {
    if self.base_neighbor == Some(old) {
      self.base_neighbor = Some(new);
    } else if self.left_neighbor == Some(old) {
      self.left_neighbor = Some(new);
    } else if self.right_neighbor == Some(old) {
      self.right_neighbor = Some(new);
    } else {
      return false;
    }
    true
  }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
