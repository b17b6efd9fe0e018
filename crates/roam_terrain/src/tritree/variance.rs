//! Variance trees - per-triangle interpolation error bounds.
//!
//! For every addressable triangle of a base tree, the stored value is the
//! largest deviation between the real heightfield and the flat
//! interpolation, over the triangle itself and everything beneath it. An
//! ancestor therefore bounds every descendant, which is what lets
//! tessellation prune whole subtrees after one lookup.

use glam::{IVec2, Vec3};

use super::corners::TriCorners;
use crate::constants::{is_addressable, MIN_VARIANCE_SPAN, ROOT_ADDRESS, VARIANCE_NODES};
use crate::heightmap::HeightMap;

/// Local errors at shore crossings are raised to at least this value.
const SHORE_LINE_MIN_VARIANCE: f32 = 20.0;
const SHORE_LINE_SCALE: f32 = 1.5;

/// Flat binary-addressed variance array (see [`crate::constants`]).
#[derive(Clone)]
pub struct VarianceTree {
  values: Box<[f32]>,
}

impl VarianceTree {
  /// All-zero tree.
  pub fn new() -> Self {
    Self {
      values: vec![0.0; VARIANCE_NODES].into_boxed_slice(),
    }
  }

  /// Variance at `addr`; 0 for addresses without storage.
  #[inline]
  pub fn get(&self, addr: usize) -> f32 {
    if is_addressable(addr) {
      self.values[addr]
    } else {
      0.0
    }
  }

  #[inline]
  fn set(&mut self, addr: usize, value: f32) {
    if is_addressable(addr) {
      self.values[addr] = value;
    }
  }

  /// Zero every slot.
  pub fn clear(&mut self) {
    self.values.fill(0.0);
  }

  /// Root variance: the error bound of the whole base triangle.
  #[inline]
  pub fn root(&self) -> f32 {
    self.values[ROOT_ADDRESS]
  }

  /// Raw slots; index 0 is unused.
  pub fn as_slice(&self) -> &[f32] {
    &self.values
  }
}

impl Default for VarianceTree {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for VarianceTree {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("VarianceTree")
      .field("root", &self.root())
      .finish_non_exhaustive()
  }
}

/// Fills a [`VarianceTree`] from a height provider.
pub struct VarianceBuilder<'a, H: HeightMap + ?Sized> {
  heights: &'a H,
  tree: &'a mut VarianceTree,
  shore_line_boost: bool,
}

impl<'a, H: HeightMap + ?Sized> VarianceBuilder<'a, H> {
  pub fn new(heights: &'a H, tree: &'a mut VarianceTree, shore_line_boost: bool) -> Self {
    Self {
      heights,
      tree,
      shore_line_boost,
    }
  }

  /// Rebuild the whole tree for the base triangle `corners`.
  ///
  /// Returns the root variance.
  pub fn build(&mut self, corners: &TriCorners) -> f32 {
    self.tree.clear();

    let hgts = Vec3::new(
      self.heights.height_at(corners.left),
      self.heights.height_at(corners.right),
      self.heights.height_at(corners.apex),
    );
    self.recurs_compute_variance(corners.left, corners.right, corners.apex, hgts, ROOT_ADDRESS)
  }

  /// Variance of the triangle at `addr` and everything below it.
  ///
  /// `hgts` holds the corner heights `(left, right, apex)` so each level
  /// samples only its hypotenuse midpoint. Refinement stops once the
  /// hypotenuse spans fewer than `MIN_VARIANCE_SPAN` units or the children
  /// would fall past the last addressable level.
  pub fn recurs_compute_variance(
    &mut self,
    left: IVec2,
    right: IVec2,
    apex: IVec2,
    hgts: Vec3,
    addr: usize,
  ) -> f32 {
    if !is_addressable(addr) {
      return 0.0;
    }

    let corners = TriCorners::new(left, right, apex);
    let mid = corners.center();
    let mid_height = self.heights.height_at(mid);

    let mut variance = (mid_height - (hgts.x + hgts.y) * 0.5).abs();

    if self.shore_line_boost && crosses_shore(hgts.x, hgts.y, mid_height) {
      variance = (variance * SHORE_LINE_SCALE).max(SHORE_LINE_MIN_VARIANCE);
    }

    if corners.size() >= MIN_VARIANCE_SPAN && is_addressable(addr << 1) {
      let left_variance = self.recurs_compute_variance(
        apex,
        left,
        mid,
        Vec3::new(hgts.z, hgts.x, mid_height),
        addr << 1,
      );
      let right_variance = self.recurs_compute_variance(
        right,
        apex,
        mid,
        Vec3::new(hgts.y, hgts.z, mid_height),
        (addr << 1) + 1,
      );
      variance = variance.max(left_variance).max(right_variance);
    }

    self.tree.set(addr, variance);
    variance
  }
}

/// Whether the sampled heights lie strictly on both sides of zero.
#[inline]
fn crosses_shore(a: f32, b: f32, c: f32) -> bool {
  a.min(b).min(c) < 0.0 && a.max(b).max(c) > 0.0
}

#[cfg(test)]
#[path = "variance_test.rs"]
mod variance_test;
