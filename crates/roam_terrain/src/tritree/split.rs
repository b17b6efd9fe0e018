//! Split and recursive tessellation over pooled bintree nodes.
//!
//! # Diamonds
//!
//! A triangle and its base neighbor form a diamond when each is the other's
//! base neighbor. Diamonds are always split together, otherwise the shared
//! hypotenuse would gain a midpoint vertex on one side only (T-junction).
//! When the base neighbor is not diamond-aligned it is coarser, and it is
//! force-split first, recursively, until it is.
//!
//! Splitting is append-only: nothing here merges children back. A fresh
//! triangulation starts from a reset pool.

use glam::IVec2;

use super::corners::TriCorners;
use super::node::NodeId;
use super::pool::TriNodePool;
use super::variance::VarianceTree;
use crate::config::LodConfig;
use crate::constants::{is_addressable, PATCH_SIZE, ROOT_ADDRESS};

/// Split `tri` into two children, forcing splits on coarser neighbors.
///
/// Returns `true` if `tri` is a branch afterwards. On pool exhaustion returns
/// `false`; `tri` and its diamond partner are then left untouched (forced
/// splits already performed on coarser neighbors remain, they are valid
/// triangulations on their own).
pub fn split(pool: &mut TriNodePool, tri: NodeId) -> bool {
  if pool[tri].is_branch() {
    return true;
  }

  // Forced split: a coarser base neighbor must split until its child along
  // our hypotenuse points back at us.
  if let Some(base) = pool[tri].base_neighbor {
    if pool[base].base_neighbor != Some(tri) && !split(pool, base) {
      return false;
    }
  }

  // Re-read: the forced split may have relinked our neighbors.
  let node = pool[tri];

  // One pair for us, one more if the diamond partner still has to split.
  let needed = match node.base_neighbor {
    Some(base) if pool[base].is_leaf() => 2,
    _ => 1,
  };
  if pool.free_pairs() < needed {
    return false;
  }

  let Some((lc, rc)) = pool.allocate() else {
    return false;
  };
  pool[tri].children = Some((lc, rc));

  pool[lc].base_neighbor = node.left_neighbor;
  pool[lc].left_neighbor = Some(rc);
  pool[rc].base_neighbor = node.right_neighbor;
  pool[rc].right_neighbor = Some(lc);

  if let Some(left) = node.left_neighbor {
    pool[left].replace_neighbor(tri, lc);
  }
  if let Some(right) = node.right_neighbor {
    pool[right].replace_neighbor(tri, rc);
  }

  // Without a base neighbor the outer legs lie on the mesh border and stay
  // unlinked.
  if let Some(base) = node.base_neighbor {
    match pool[base].children {
      Some((base_lc, base_rc)) => {
        pool[base_lc].right_neighbor = Some(rc);
        pool[base_rc].left_neighbor = Some(lc);
        pool[lc].right_neighbor = Some(base_rc);
        pool[rc].left_neighbor = Some(base_lc);
      }
      None => {
        // Reserved above, cannot run dry.
        let diamond = split(pool, base);
        debug_assert!(diamond, "diamond partner split failed after reservation");
      }
    }
  }

  true
}

/// Error-driven refinement of one base triangle.
///
/// Holds the per-pass LOD parameters and counts split failures; pool
/// exhaustion only stops refinement of the subtree that hit it.
pub struct Tessellator<'a> {
  pool: &'a mut TriNodePool,
  variance: &'a VarianceTree,
  lod_factor: f32,
  variance_limit: f32,
  split_threshold: f32,
  splits: usize,
  failed_splits: usize,
}

impl<'a> Tessellator<'a> {
  pub fn new(
    pool: &'a mut TriNodePool,
    variance: &'a VarianceTree,
    lod: &LodConfig,
    lod_factor: f32,
  ) -> Self {
    Self {
      pool,
      variance,
      lod_factor,
      variance_limit: lod.variance_limit(lod_factor),
      split_threshold: lod.split_threshold,
      splits: 0,
      failed_splits: 0,
    }
  }

  /// Refine `root` spanning `corners`, starting at the root address.
  pub fn tessellate(&mut self, root: NodeId, corners: TriCorners) {
    self.recurs_tessellate(root, corners.left, corners.right, corners.apex, ROOT_ADDRESS);
  }

  /// Refine `tri` (grid corners `left`, `right`, `apex`) at variance address
  /// `addr`.
  ///
  /// Branches are always descended; leaves split when their clamped,
  /// distance-scaled variance exceeds the split threshold.
  pub fn recurs_tessellate(
    &mut self,
    tri: NodeId,
    left: IVec2,
    right: IVec2,
    apex: IVec2,
    addr: usize,
  ) {
    // No variance stored past the tree depth.
    if !is_addressable(addr) {
      return;
    }

    let corners = TriCorners::new(left, right, apex);
    if self.pool[tri].is_leaf() {
      if !corners.can_subdivide() {
        return;
      }

      let variance = self.variance.get(addr).min(self.variance_limit);
      let error = variance * PATCH_SIZE as f32 * corners.size() as f32 * self.lod_factor;
      if error <= self.split_threshold {
        return;
      }

      if !split(self.pool, tri) {
        self.failed_splits += 1;
        return;
      }
      self.splits += 1;
    }

    let Some((lc, rc)) = self.pool[tri].children else {
      return;
    };
    let center = corners.center();
    self.recurs_tessellate(lc, apex, left, center, addr << 1);
    self.recurs_tessellate(rc, right, apex, center, (addr << 1) + 1);
  }

  /// Successful error-driven splits (forced splits not included).
  pub fn splits(&self) -> usize {
    self.splits
  }

  /// Splits abandoned because the pool ran dry.
  pub fn failed_splits(&self) -> usize {
    self.failed_splits
  }
}

#[cfg(test)]
#[path = "split_test.rs"]
mod split_test;
