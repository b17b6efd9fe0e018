//! Triangle corner coordinates on the heightmap grid.

use glam::IVec2;

use crate::constants::PATCH_SIZE;

/// Grid corners of one bintree triangle.
///
/// `left -> right` is the hypotenuse, `apex` the right-angle corner. Grid
/// coordinates are `(x, z)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriCorners {
  pub left: IVec2,
  pub right: IVec2,
  pub apex: IVec2,
}

impl TriCorners {
  pub const fn new(left: IVec2, right: IVec2, apex: IVec2) -> Self {
    Self { left, right, apex }
  }

  /// Upper-left base triangle of the patch at `origin`.
  pub fn patch_left(origin: IVec2) -> Self {
    Self::new(
      origin + IVec2::new(0, PATCH_SIZE),
      origin + IVec2::new(PATCH_SIZE, 0),
      origin,
    )
  }

  /// Lower-right base triangle of the patch at `origin`.
  pub fn patch_right(origin: IVec2) -> Self {
    Self::new(
      origin + IVec2::new(PATCH_SIZE, 0),
      origin + IVec2::new(0, PATCH_SIZE),
      origin + IVec2::splat(PATCH_SIZE),
    )
  }

  /// Midpoint of the hypotenuse (the apex of both children).
  #[inline]
  pub fn center(&self) -> IVec2 {
    (self.left + self.right) / 2
  }

  /// Larger axis extent of the hypotenuse, in grid units.
  #[inline]
  pub fn size(&self) -> i32 {
    let extent = (self.left - self.right).abs();
    extent.x.max(extent.y)
  }

  /// Whether the hypotenuse spans more than one grid unit on some axis.
  #[inline]
  pub fn can_subdivide(&self) -> bool {
    self.size() > 1
  }

  /// Corners of the `(left, right)` children.
  #[inline]
  pub fn children(&self) -> (TriCorners, TriCorners) {
    let center = self.center();
    (
      TriCorners::new(self.apex, self.left, center),
      TriCorners::new(self.right, self.apex, center),
    )
  }

  /// The three hypotenuse-first edges `(left, right)`, `(right, apex)`,
  /// `(apex, left)`.
  pub fn edges(&self) -> [(IVec2, IVec2); 3] {
    [
      (self.left, self.right),
      (self.right, self.apex),
      (self.apex, self.left),
    ]
  }
}
