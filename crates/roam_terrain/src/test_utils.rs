//! Shared test fixtures: synthetic heightfields, a scripted camera and a
//! conformity checker for leaf triangulations.

use std::collections::HashMap;

use glam::{IVec2, Vec3};

use crate::camera::ViewCamera;
use crate::constants::PATCH_SIZE;
use crate::heightmap::GridHeightMap;
use crate::tritree::{NodeId, TriCorners, TriNodePool};
use crate::types::CameraType;

// =============================================================================
// Heightfields
// =============================================================================

/// One-patch flat map.
pub fn flat_patch_map(height: f32) -> GridHeightMap {
  GridHeightMap::flat(PATCH_SIZE, PATCH_SIZE, height)
}

/// One-patch map, flat at 0 except one spike at the patch center.
pub fn spike_patch_map(spike: f32) -> GridHeightMap {
  let mut map = flat_patch_map(0.0);
  map.set_height(PATCH_SIZE / 2, PATCH_SIZE / 2, spike);
  map
}

/// Smooth rolling hills, strictly positive (no shore lines).
pub fn hills_map(width: i32, depth: i32, amplitude: f32) -> GridHeightMap {
  GridHeightMap::from_fn(width, depth, |x, z| {
    let fx = x as f32 * 0.05;
    let fz = z as f32 * 0.07;
    amplitude * (1.5 + fx.sin() * fz.cos() + 0.3 * (fx * 3.1 + fz * 1.7).sin())
  })
}

// =============================================================================
// Camera
// =============================================================================

/// Camera with scripted visibility.
#[derive(Clone, Debug)]
pub struct TestCamera {
  pub position: Vec3,
  pub view_radius: f32,
  pub camera_type: CameraType,
  /// Boxes intersecting this xz-range are visible; `None` sees everything.
  pub visible_xz: Option<(IVec2, IVec2)>,
}

impl TestCamera {
  pub fn new(position: Vec3, view_radius: f32) -> Self {
    Self {
      position,
      view_radius,
      camera_type: CameraType::Player,
      visible_xz: None,
    }
  }

  pub fn with_type(mut self, camera_type: CameraType) -> Self {
    self.camera_type = camera_type;
    self
  }

  pub fn seeing(mut self, min: IVec2, max: IVec2) -> Self {
    self.visible_xz = Some((min, max));
    self
  }

  pub fn blind(self) -> Self {
    self.seeing(IVec2::splat(i32::MAX), IVec2::splat(i32::MAX))
  }
}

impl ViewCamera for TestCamera {
  fn position(&self) -> Vec3 {
    self.position
  }

  fn view_radius(&self) -> f32 {
    self.view_radius
  }

  fn camera_type(&self) -> CameraType {
    self.camera_type
  }

  fn is_box_visible(&self, min: Vec3, max: Vec3) -> bool {
    match self.visible_xz {
      None => true,
      Some((lo, hi)) => {
        max.x >= lo.x as f32 && min.x <= hi.x as f32 && max.z >= lo.y as f32 && min.z <= hi.y as f32
      }
    }
  }
}

// =============================================================================
// Tree helpers
// =============================================================================

/// Allocate a base pair linked as each other's base neighbor.
pub fn diamond(pool: &mut TriNodePool) -> (NodeId, NodeId) {
  let (left, right) = pool.allocate().expect("pool has room for a diamond");
  pool[left].base_neighbor = Some(right);
  pool[right].base_neighbor = Some(left);
  (left, right)
}

/// All leaves below the given roots.
pub fn collect_leaves(pool: &TriNodePool, roots: &[(NodeId, TriCorners)]) -> Vec<TriCorners> {
  let mut leaves = Vec::new();
  for &(root, corners) in roots {
    crate::tritree::for_each_leaf(pool, root, corners, |_, tri| leaves.push(*tri));
  }
  leaves
}

/// Every node reachable below `root`, branches included.
pub fn collect_nodes(pool: &TriNodePool, root: NodeId) -> Vec<NodeId> {
  let mut nodes = vec![root];
  let mut i = 0;
  while i < nodes.len() {
    if let Some((lc, rc)) = pool[nodes[i]].children {
      nodes.push(lc);
      nodes.push(rc);
    }
    i += 1;
  }
  nodes
}

fn edge_key(a: IVec2, b: IVec2) -> (IVec2, IVec2) {
  if (a.x, a.y) <= (b.x, b.y) {
    (a, b)
  } else {
    (b, a)
  }
}

fn on_border(a: IVec2, b: IVec2, min: IVec2, max: IVec2) -> bool {
  (a.x == b.x && (a.x == min.x || a.x == max.x)) || (a.y == b.y && (a.y == min.y || a.y == max.y))
}

/// Assert a leaf set is a conforming triangulation of the `min..max` square:
/// every interior edge is shared by exactly two leaves, so no edge ends in a
/// T-junction, and only edges on the outer border are unpaired.
pub fn assert_conforming(leaves: &[TriCorners], min: IVec2, max: IVec2) {
  let mut edges: HashMap<(IVec2, IVec2), usize> = HashMap::new();
  for tri in leaves {
    for (a, b) in tri.edges() {
      *edges.entry(edge_key(a, b)).or_default() += 1;
    }
  }

  for ((a, b), count) in &edges {
    if on_border(*a, *b, min, max) {
      assert_eq!(*count, 1, "Border edge {:?}-{:?} shared {} times", a, b, count);
    } else {
      assert_eq!(
        *count, 2,
        "Interior edge {:?}-{:?} has {} leaf sides (crack / T-junction)",
        a, b, count
      );
    }
  }

  let area: i64 = leaves
    .iter()
    .map(|t| {
      let u = t.right - t.left;
      let v = t.apex - t.left;
      (u.x as i64 * v.y as i64 - u.y as i64 * v.x as i64).abs()
    })
    .sum();
  let extent = max - min;
  assert_eq!(
    area,
    2 * extent.x as i64 * extent.y as i64,
    "Leaves must tile the square exactly"
  );
}
