//! Core value types shared across the tessellation pipeline.

use glam::IVec2;

/// Render pass a mesh (and its node pools) belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
  /// Regular camera pass.
  Normal,
  /// Shadow-map pass (viewed by the shadow camera only).
  Shadow,
}

impl PassKind {
  /// All pass kinds, in registry order.
  pub const ALL: [PassKind; 2] = [PassKind::Normal, PassKind::Shadow];

  /// Index into per-pass arrays.
  #[inline]
  pub fn index(self) -> usize {
    match self {
      PassKind::Normal => 0,
      PassKind::Shadow => 1,
    }
  }
}

/// Camera slot used for per-patch visibility bookkeeping.
///
/// Shadow-mesh patches are only ever viewed by one camera type, normal-mesh
/// patches can be viewed by several.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CameraType {
  Player,
  UnderwaterReflection,
  Shadow,
  EnvironmentMap,
}

impl CameraType {
  /// Number of camera slots tracked per patch.
  pub const COUNT: usize = 4;

  #[inline]
  pub fn index(self) -> usize {
    match self {
      CameraType::Player => 0,
      CameraType::UnderwaterReflection => 1,
      CameraType::Shadow => 2,
      CameraType::EnvironmentMap => 3,
    }
  }
}

/// Inclusive integer rectangle on the heightmap grid.
///
/// `x1..=x2` by `z1..=z2`, in corner-sample coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
  pub x1: i32,
  pub z1: i32,
  pub x2: i32,
  pub z2: i32,
}

impl Rect {
  pub fn new(x1: i32, z1: i32, x2: i32, z2: i32) -> Self {
    Self { x1, z1, x2, z2 }
  }

  /// Rectangle covering a square of `size` quads starting at the origin.
  pub fn square(size: i32) -> Self {
    Self::new(0, 0, size, size)
  }

  /// Check whether the rectangle contains no samples.
  pub fn is_empty(&self) -> bool {
    self.x1 > self.x2 || self.z1 > self.z2
  }

  /// Intersection of two rectangles (may be empty).
  pub fn intersect(&self, other: &Rect) -> Rect {
    Rect {
      x1: self.x1.max(other.x1),
      z1: self.z1.max(other.z1),
      x2: self.x2.min(other.x2),
      z2: self.z2.min(other.z2),
    }
  }

  /// Shift the rectangle by `-offset` (world to local coordinates).
  pub fn to_local(&self, offset: IVec2) -> Rect {
    Rect {
      x1: self.x1 - offset.x,
      z1: self.z1 - offset.y,
      x2: self.x2 - offset.x,
      z2: self.z2 - offset.y,
    }
  }

  /// Iterate all `(x, z)` samples in row-major order.
  pub fn samples(&self) -> impl Iterator<Item = (i32, i32)> {
    let (x1, x2) = (self.x1, self.x2);
    (self.z1..=self.z2).flat_map(move |z| (x1..=x2).map(move |x| (x, z)))
  }
}

/// Generated per-patch geometry, opaque to the tessellation core.
///
/// Vertices are world positions of every grid corner of the patch; indices
/// reference them three per leaf triangle.
#[derive(Clone, Debug, Default)]
pub struct MeshBuffers {
  pub vertices: Vec<[f32; 3]>,
  pub indices: Vec<u32>,
}

impl MeshBuffers {
  /// Number of triangles in the index buffer.
  #[inline]
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
