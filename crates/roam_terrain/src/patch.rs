//! Patch - one `PATCH_SIZE` square tile of terrain.
//!
//! A patch owns the variance trees of its two base triangles, its vertex
//! and index buffers, and visibility / dirty / upload bookkeeping. Its tree
//! nodes live in a [`TriNodePool`]; the patch only remembers the base pair
//! and which pool it came from.
//!
//! # Per-frame flow
//!
//! ```text
//! reset -> attach_to_pool -> (neighbor linking) -> tessellate -> generate_indices
//! ```
//!
//! `tessellate` attaches on its own when used standalone, and rebuilds the
//! variance trees first whenever the patch is dirty.

use glam::{IVec2, Vec3};

use crate::camera::ViewCamera;
use crate::config::LodConfig;
use crate::constants::{vertex_index, PATCH_SIZE, PATCH_VERTEX_COUNT, PATCH_VERTS, ROOT_ADDRESS};
use crate::heightmap::HeightMap;
use crate::render_mode::{render_mode, RenderMode};
use crate::tritree::{
  for_each_leaf, NodeId, PoolRegistry, Tessellator, TriCorners, TriNodePool, VarianceBuilder,
  VarianceTree,
};
use crate::types::{CameraType, MeshBuffers, PassKind, Rect};

/// Which pool a patch's nodes were allocated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolBinding {
  pub pass: PassKind,
  pub worker: usize,
}

/// Outcome of one patch tessellation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchTessellation {
  /// Error-driven splits performed.
  pub splits: usize,
  /// Splits abandoned on pool exhaustion.
  pub failed_splits: usize,
}

impl PatchTessellation {
  /// Whether tessellation completed without running out of nodes.
  #[inline]
  pub fn completed(&self) -> bool {
    self.failed_splits == 0
  }
}

pub struct Patch {
  /// World grid offset of the patch corner.
  origin: IVec2,

  lod: LodConfig,

  /// `(base_left, base_right)` while attached to a pool.
  base: Option<(NodeId, NodeId)>,
  binding: Option<PoolBinding>,
  /// Epoch of the pool `base` was allocated from.
  pool_epoch: u64,

  variance_left: VarianceTree,
  variance_right: VarianceTree,

  /// Variance trees are stale.
  is_dirty: bool,

  min_height: f32,
  max_height: f32,

  buffers: MeshBuffers,

  /// Mode the vertex buffer was last uploaded with.
  uploaded_mode: Option<RenderMode>,
  /// Indices regenerated since the last upload.
  indices_changed: bool,

  /// Frame on which this patch was last visible, per camera type.
  ///
  /// Shadow-mesh patches are only ever viewed by one camera; normal-mesh
  /// patches can be viewed by several camera types in one frame.
  last_draw_frames: [Option<u32>; CameraType::COUNT],
}

impl Patch {
  /// Create the patch at world grid offset `(x, z)` and read its heights.
  ///
  /// The patch starts dirty: variance is built before the first
  /// tessellation.
  pub fn new<H: HeightMap + ?Sized>(heights: &H, x: i32, z: i32, lod: LodConfig) -> Self {
    let origin = IVec2::new(x, z);
    let mut vertices = Vec::with_capacity(PATCH_VERTEX_COUNT);
    for vz in 0..PATCH_VERTS {
      for vx in 0..PATCH_VERTS {
        let (wx, wz) = (x + vx, z + vz);
        vertices.push([wx as f32, heights.height(wx, wz), wz as f32]);
      }
    }

    let mut patch = Self {
      origin,
      lod,
      base: None,
      binding: None,
      pool_epoch: 0,
      variance_left: VarianceTree::new(),
      variance_right: VarianceTree::new(),
      is_dirty: true,
      min_height: 0.0,
      max_height: 0.0,
      buffers: MeshBuffers {
        vertices,
        indices: Vec::new(),
      },
      uploaded_mode: None,
      indices_changed: false,
      last_draw_frames: [None; CameraType::COUNT],
    };
    patch.update_bounds();
    patch
  }

  /// Drop the triangulation (roots, pool binding, indices).
  ///
  /// Pool resets are detected through the pool epoch; this also clears the
  /// index buffer.
  pub fn reset(&mut self) {
    self.base = None;
    self.binding = None;
    self.buffers.indices.clear();
    self.indices_changed = true;
  }

  /// Allocate the base pair from `pool` and link it as a diamond.
  ///
  /// Returns false when the pool cannot hold the pair; the patch then stays
  /// detached and renders nothing this frame.
  pub fn attach_to_pool(&mut self, pool: &mut TriNodePool, binding: PoolBinding) -> bool {
    self.reset();

    let Some((left, right)) = pool.allocate() else {
      return false;
    };
    pool[left].base_neighbor = Some(right);
    pool[right].base_neighbor = Some(left);

    self.base = Some((left, right));
    self.binding = Some(binding);
    self.pool_epoch = pool.epoch();
    true
  }

  /// Root of the upper-left base triangle, while attached.
  #[inline]
  pub fn base_left(&self) -> Option<NodeId> {
    self.base.map(|(left, _)| left)
  }

  /// Root of the lower-right base triangle, while attached.
  #[inline]
  pub fn base_right(&self) -> Option<NodeId> {
    self.base.map(|(_, right)| right)
  }

  #[inline]
  pub fn binding(&self) -> Option<PoolBinding> {
    self.binding
  }

  /// Whether the base pair was allocated from `pool` since its last reset.
  #[inline]
  pub fn is_attached_to(&self, pool: &TriNodePool) -> bool {
    self.base.is_some() && self.pool_epoch == pool.epoch()
  }

  #[inline]
  pub fn origin(&self) -> IVec2 {
    self.origin
  }

  #[inline]
  pub fn is_dirty(&self) -> bool {
    self.is_dirty
  }

  /// Triangles in the current index buffer.
  #[inline]
  pub fn tri_count(&self) -> usize {
    self.buffers.triangle_count()
  }

  #[inline]
  pub fn buffers(&self) -> &MeshBuffers {
    &self.buffers
  }

  pub fn variance_left(&self) -> &VarianceTree {
    &self.variance_left
  }

  pub fn variance_right(&self) -> &VarianceTree {
    &self.variance_right
  }

  /// Corners of the two base triangles.
  pub fn base_corners(&self) -> [TriCorners; 2] {
    [
      TriCorners::patch_left(self.origin),
      TriCorners::patch_right(self.origin),
    ]
  }

  /// World-space bounding box `(min, max)`.
  pub fn bounds(&self) -> (Vec3, Vec3) {
    let min = Vec3::new(self.origin.x as f32, self.min_height, self.origin.y as f32);
    let size = PATCH_SIZE as f32;
    (min, Vec3::new(min.x + size, self.max_height, min.z + size))
  }

  /// Point the LOD distance is measured from.
  pub fn lod_center(&self) -> Vec3 {
    let half = (PATCH_SIZE / 2) as f32;
    Vec3::new(
      self.origin.x as f32 + half,
      (self.min_height + self.max_height) * 0.5,
      self.origin.y as f32 + half,
    )
  }

  // ===========================================================================
  // Variance
  // ===========================================================================

  /// Rebuild both variance trees and clear the dirty flag.
  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "patch::compute_variance"))]
  pub fn compute_variance<H: HeightMap + ?Sized>(&mut self, heights: &H) {
    let [left, right] = self.base_corners();
    let boost = self.lod.shore_line_boost;

    let root_left = VarianceBuilder::new(heights, &mut self.variance_left, boost).build(&left);
    let root_right = VarianceBuilder::new(heights, &mut self.variance_right, boost).build(&right);
    self.is_dirty = false;

    tracing::trace!(origin = ?self.origin, root_left, root_right, "rebuilt patch variance");
  }

  // ===========================================================================
  // Tessellation
  // ===========================================================================

  /// Tessellate using the calling worker's pool for `pass`.
  ///
  /// Returns whether tessellation completed without pool exhaustion.
  pub fn tessellate<H: HeightMap + ?Sized>(
    &mut self,
    pools: &mut PoolRegistry,
    pass: PassKind,
    heights: &H,
    cam_pos: Vec3,
    view_radius: f32,
  ) -> bool {
    let worker = pools.worker_slot();
    let pool = pools.get_pool(pass);
    self
      .tessellate_with(pool, PoolBinding { pass, worker }, heights, cam_pos, view_radius)
      .completed()
  }

  /// Tessellate with an explicit pool.
  ///
  /// Attaches to `pool` unless already bound to it in its current epoch, and
  /// keeps any existing splits: repeated calls without a pool reset only
  /// refine further. After a pool reset the trees start over from the base
  /// pair.
  pub fn tessellate_with<H: HeightMap + ?Sized>(
    &mut self,
    pool: &mut TriNodePool,
    binding: PoolBinding,
    heights: &H,
    cam_pos: Vec3,
    view_radius: f32,
  ) -> PatchTessellation {
    if self.is_dirty {
      self.compute_variance(heights);
    }

    if self.binding != Some(binding) || !self.is_attached_to(pool) {
      if !self.attach_to_pool(pool, binding) {
        return PatchTessellation {
          splits: 0,
          failed_splits: 1,
        };
      }
    }
    let Some((left, right)) = self.base else {
      return PatchTessellation::default();
    };

    let distance = self.lod_center().distance(cam_pos);
    let lod_factor = self.lod.cam_dist_lod_factor(distance, view_radius);
    let [left_corners, right_corners] = self.base_corners();

    let mut result = PatchTessellation::default();
    for (root, corners, variance) in [
      (left, left_corners, &self.variance_left),
      (right, right_corners, &self.variance_right),
    ] {
      let mut tessellator = Tessellator::new(pool, variance, &self.lod, lod_factor);
      tessellator.recurs_tessellate(root, corners.left, corners.right, corners.apex, ROOT_ADDRESS);
      result.splits += tessellator.splits();
      result.failed_splits += tessellator.failed_splits();
    }
    result
  }

  /// Flatten the trees into the index buffer, three grid-vertex indices per
  /// leaf.
  ///
  /// Emits nothing unless the patch is attached to `pool`.
  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "patch::generate_indices"))]
  pub fn generate_indices(&mut self, pool: &TriNodePool) {
    let mut indices = std::mem::take(&mut self.buffers.indices);
    indices.clear();

    let origin = self.origin;
    self.for_each_leaf_corners(pool, |tri| {
      for corner in [tri.apex, tri.left, tri.right] {
        indices.push(vertex_index(origin.x, origin.y, corner.x, corner.y));
      }
    });

    self.buffers.indices = indices;
    self.indices_changed = true;
  }

  /// Leaf triangles as `[left, right, apex]` world grid corners.
  pub fn leaf_triangles(&self, pool: &TriNodePool) -> Vec<[IVec2; 3]> {
    let mut triangles = Vec::new();
    self.for_each_leaf_corners(pool, |tri| triangles.push([tri.left, tri.right, tri.apex]));
    triangles
  }

  fn for_each_leaf_corners(&self, pool: &TriNodePool, mut visit: impl FnMut(&TriCorners)) {
    let Some((left, right)) = self.base.filter(|_| self.is_attached_to(pool)) else {
      return;
    };
    let [left_corners, right_corners] = self.base_corners();
    for_each_leaf(pool, left, left_corners, |_, tri| visit(tri));
    for_each_leaf(pool, right, right_corners, |_, tri| visit(tri));
  }

  // ===========================================================================
  // Visibility
  // ===========================================================================

  /// Record `frame` for the camera's slot if the camera sees this patch.
  pub fn update_visibility<C: ViewCamera + ?Sized>(&mut self, camera: &C, frame: u32) -> bool {
    let (min, max) = self.bounds();
    let visible = camera.is_box_visible(min, max);
    if visible {
      self.last_draw_frames[camera.camera_type().index()] = Some(frame);
    }
    visible
  }

  /// Whether the patch was found visible by `camera` on `frame`.
  #[inline]
  pub fn is_visible<C: ViewCamera + ?Sized>(&self, camera: &C, frame: u32) -> bool {
    self.is_visible_to(camera.camera_type(), frame)
  }

  #[inline]
  pub fn is_visible_to(&self, camera_type: CameraType, frame: u32) -> bool {
    self.last_draw_frames[camera_type.index()] == Some(frame)
  }

  pub fn last_draw_frame(&self, camera_type: CameraType) -> Option<u32> {
    self.last_draw_frames[camera_type.index()]
  }

  // ===========================================================================
  // Heightmap updates
  // ===========================================================================

  /// Refresh vertex heights inside `rect` (patch-local, inclusive; whole
  /// patch when `None`) and mark the variance stale.
  pub fn update_height_map<H: HeightMap + ?Sized>(&mut self, heights: &H, rect: Option<Rect>) {
    let rect = rect
      .unwrap_or(Rect::square(PATCH_SIZE))
      .intersect(&Rect::square(PATCH_SIZE));

    if !rect.is_empty() {
      for (x, z) in rect.samples() {
        let (wx, wz) = (self.origin.x + x, self.origin.y + z);
        let idx = (z * PATCH_VERTS + x) as usize;
        self.buffers.vertices[idx][1] = heights.height(wx, wz);
      }
      self.update_bounds();
    }

    self.is_dirty = true;
    self.uploaded_mode = None;
  }

  fn update_bounds(&mut self) {
    let (min, max) = self
      .buffers
      .vertices
      .iter()
      .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v[1]), hi.max(v[1])));
    self.min_height = min;
    self.max_height = max;
  }

  // ===========================================================================
  // Upload bookkeeping
  // ===========================================================================

  /// Whether vertices must be (re)uploaded for the current render mode.
  #[inline]
  pub fn needs_vertex_upload(&self) -> bool {
    self.needs_vertex_upload_for(render_mode())
  }

  #[inline]
  pub fn needs_vertex_upload_for(&self, mode: RenderMode) -> bool {
    self.uploaded_mode != Some(mode)
  }

  /// Whether indices changed since the last upload.
  #[inline]
  pub fn needs_index_upload(&self) -> bool {
    self.indices_changed
  }

  /// Record a completed upload of vertices and indices with `mode`.
  pub fn mark_uploaded(&mut self, mode: RenderMode) {
    self.uploaded_mode = Some(mode);
    self.indices_changed = false;
  }
}

#[cfg(test)]
#[path = "patch_test.rs"]
mod patch_test;
