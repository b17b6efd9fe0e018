//! Height provider seam.
//!
//! The tessellation core only ever reads single corner heights; storage,
//! streaming and persistence belong to the caller.

use glam::IVec2;

/// Source of terrain heights on an integer corner grid.
///
/// Grid coordinates run `0..=width()` by `0..=depth()`. Implementations
/// should clamp out-of-range coordinates rather than panic.
pub trait HeightMap {
  /// Width of the map in quads.
  fn width(&self) -> i32;

  /// Depth (z extent) of the map in quads.
  fn depth(&self) -> i32;

  /// Height of the corner sample at `(x, z)`.
  fn height(&self, x: i32, z: i32) -> f32;

  /// Height at a grid position.
  #[inline]
  fn height_at(&self, pos: IVec2) -> f32 {
    self.height(pos.x, pos.y)
  }
}

impl<H: HeightMap + ?Sized> HeightMap for &H {
  fn width(&self) -> i32 {
    (**self).width()
  }

  fn depth(&self) -> i32 {
    (**self).depth()
  }

  fn height(&self, x: i32, z: i32) -> f32 {
    (**self).height(x, z)
  }
}

/// Dense in-memory heightmap of `(width + 1) * (depth + 1)` corner samples.
#[derive(Clone, Debug)]
pub struct GridHeightMap {
  width: i32,
  depth: i32,
  heights: Vec<f32>,
}

impl GridHeightMap {
  /// Map of constant height.
  pub fn flat(width: i32, depth: i32, height: f32) -> Self {
    let count = ((width + 1) * (depth + 1)).max(0) as usize;
    Self {
      width,
      depth,
      heights: vec![height; count],
    }
  }

  /// Map sampled from a function of the corner coordinates.
  pub fn from_fn(width: i32, depth: i32, mut f: impl FnMut(i32, i32) -> f32) -> Self {
    let mut map = Self::flat(width, depth, 0.0);
    for z in 0..=depth {
      for x in 0..=width {
        let idx = map.index(x, z);
        map.heights[idx] = f(x, z);
      }
    }
    map
  }

  #[inline]
  fn index(&self, x: i32, z: i32) -> usize {
    let x = x.clamp(0, self.width);
    let z = z.clamp(0, self.depth);
    (z * (self.width + 1) + x) as usize
  }

  /// Overwrite one corner sample. Out-of-range writes are ignored.
  pub fn set_height(&mut self, x: i32, z: i32, height: f32) {
    if x < 0 || z < 0 || x > self.width || z > self.depth {
      return;
    }
    let idx = self.index(x, z);
    self.heights[idx] = height;
  }

  /// Raw samples, row-major with x innermost.
  pub fn samples(&self) -> &[f32] {
    &self.heights
  }
}

impl HeightMap for GridHeightMap {
  fn width(&self) -> i32 {
    self.width
  }

  fn depth(&self) -> i32 {
    self.depth
  }

  #[inline]
  fn height(&self, x: i32, z: i32) -> f32 {
    self.heights[self.index(x, z)]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_flat_map_dimensions() {
    let map = GridHeightMap::flat(256, 128, 3.0);
    assert_eq!(map.width(), 256);
    assert_eq!(map.depth(), 128);
    assert_eq!(map.samples().len(), 257 * 129);
    assert_eq!(map.height(17, 99), 3.0);
  }

  #[test]
  fn test_out_of_range_reads_clamp() {
    let map = GridHeightMap::from_fn(4, 4, |x, z| (x * 10 + z) as f32);
    assert_eq!(map.height(-5, 2), map.height(0, 2));
    assert_eq!(map.height(9, 9), map.height(4, 4));
    assert_eq!(map.height_at(IVec2::new(3, 1)), 31.0);
  }

  #[test]
  fn test_set_height_ignores_out_of_range() {
    let mut map = GridHeightMap::flat(4, 4, 0.0);
    map.set_height(2, 2, 7.0);
    map.set_height(5, 0, 9.0);
    assert_eq!(map.height(2, 2), 7.0);
    assert!(map.samples().iter().all(|&h| h != 9.0));
  }
}
