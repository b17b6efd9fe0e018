//! RoamMesh - the patch grid of one render pass.
//!
//! Drives the per-frame pass: visibility, variance rebuilds for dirty
//! visible patches, the retessellation decision, and the rebuild itself.
//! Patches are linked across their shared edges so forced splits propagate
//! between neighbors and the whole grid stays crack-free.
//!
//! Tessellation inside one mesh is sequential (forced splits reach into
//! neighboring patches); variance rebuilds are independent per patch and run
//! on the rayon pool.

use glam::{IVec2, Vec3};
use rayon::prelude::*;

use crate::camera::ViewCamera;
use crate::config::{LodConfig, RetessellateConfig, TerrainConfig};
use crate::constants::PATCH_SIZE;
use crate::error::TerrainError;
use crate::heightmap::HeightMap;
use crate::patch::{Patch, PoolBinding};
use crate::tritree::TriNodePool;
use crate::types::{PassKind, Rect};

/// Per-frame outcome of [`RoamMesh::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TessellationStats {
  /// Patches the camera saw this frame.
  pub visible_patches: usize,
  /// Patches tessellated this frame (0 when the old mesh was kept).
  pub tessellated_patches: usize,
  /// Variance trees rebuilt (pairs, one per patch).
  pub variance_rebuilds: usize,
  /// Patches of the current triangulation whose tessellation ran out of
  /// pool nodes. Carried over on frames that keep the old mesh.
  pub exhausted_patches: usize,
  /// Triangles across visible patches.
  pub triangles: usize,
  /// Pool slots in use after the frame.
  pub nodes_used: usize,
  /// Whether the triangulation was rebuilt this frame.
  pub retessellated: bool,
}

impl TessellationStats {
  /// Whether the triangulation in use is coarser than requested because a
  /// pool ran out of nodes.
  #[inline]
  pub fn pool_exhausted(&self) -> bool {
    self.exhausted_patches > 0
  }
}

pub struct RoamMesh {
  pass: PassKind,
  patches: Vec<Patch>,
  patches_x: i32,
  patches_z: i32,
  retessellate: RetessellateConfig,

  last_cam_pos: Option<Vec3>,
  last_view_radius: f32,
  last_worker: Option<usize>,
  /// Visibility at the last rebuild; newly visible patches force a rebuild.
  tessellated_visible: Vec<bool>,
  /// Exhausted patches of the last rebuild.
  last_exhausted_patches: usize,
  force_retessellate: bool,
}

impl RoamMesh {
  /// Build the patch grid covering `heights`.
  ///
  /// The map must be a non-empty whole number of patches in each direction.
  pub fn new<H: HeightMap + ?Sized>(
    heights: &H,
    pass: PassKind,
    config: &TerrainConfig,
  ) -> Result<Self, TerrainError> {
    config.validate()?;

    let (width, depth) = (heights.width(), heights.depth());
    if width <= 0 || depth <= 0 {
      return Err(TerrainError::EmptyMap { width, depth });
    }
    if width % PATCH_SIZE != 0 || depth % PATCH_SIZE != 0 {
      return Err(TerrainError::UnalignedMap {
        width,
        depth,
        patch_size: PATCH_SIZE,
      });
    }

    let (patches_x, patches_z) = (width / PATCH_SIZE, depth / PATCH_SIZE);
    let lod: LodConfig = config.lod;
    let mut patches = Vec::with_capacity((patches_x * patches_z) as usize);
    for pz in 0..patches_z {
      for px in 0..patches_x {
        patches.push(Patch::new(heights, px * PATCH_SIZE, pz * PATCH_SIZE, lod));
      }
    }

    tracing::debug!(?pass, patches_x, patches_z, "built terrain patch grid");

    Ok(Self {
      pass,
      tessellated_visible: vec![false; patches.len()],
      patches,
      patches_x,
      patches_z,
      retessellate: config.retessellate,
      last_cam_pos: None,
      last_view_radius: 0.0,
      last_worker: None,
      last_exhausted_patches: 0,
      force_retessellate: true,
    })
  }

  #[inline]
  pub fn pass(&self) -> PassKind {
    self.pass
  }

  #[inline]
  pub fn patches(&self) -> &[Patch] {
    &self.patches
  }

  /// Patch at grid cell `(px, pz)`.
  pub fn patch(&self, px: i32, pz: i32) -> Option<&Patch> {
    self.patch_index(px, pz).map(|i| &self.patches[i])
  }

  #[inline]
  pub fn patches_x(&self) -> i32 {
    self.patches_x
  }

  #[inline]
  pub fn patches_z(&self) -> i32 {
    self.patches_z
  }

  fn patch_index(&self, px: i32, pz: i32) -> Option<usize> {
    if px < 0 || pz < 0 || px >= self.patches_x || pz >= self.patches_z {
      return None;
    }
    Some((pz * self.patches_x + px) as usize)
  }

  /// Rebuild from scratch on the next update (e.g. after its pools were
  /// re-created).
  pub fn force_retessellate(&mut self) {
    self.force_retessellate = true;
  }

  /// Drop every node id into the current pool. Call before that pool is
  /// re-created; the next update rebuilds from scratch.
  pub fn release_pool(&mut self) {
    for patch in &mut self.patches {
      patch.reset();
    }
    self.last_worker = None;
    self.last_exhausted_patches = 0;
    self.force_retessellate = true;
  }

  /// Worker whose pool holds the current triangulation.
  #[inline]
  pub fn last_worker(&self) -> Option<usize> {
    self.last_worker
  }

  /// Run one frame for `camera`, tessellating into `pool` (owned by
  /// `worker`).
  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "roam_mesh::update"))]
  pub fn update<H, C>(
    &mut self,
    heights: &H,
    camera: &C,
    frame: u32,
    pool: &mut TriNodePool,
    worker: usize,
  ) -> TessellationStats
  where
    H: HeightMap + Sync + ?Sized,
    C: ViewCamera + ?Sized,
  {
    let mut stats = TessellationStats::default();

    // Phase 1: Visibility
    let visible: Vec<bool> = {
      #[cfg(feature = "trace_spans")]
      let _span = tracing::info_span!("visibility").entered();
      self
        .patches
        .iter_mut()
        .map(|patch| patch.update_visibility(camera, frame))
        .collect()
    };
    stats.visible_patches = visible.iter().filter(|&&v| v).count();

    // Phase 2: Variance for dirty visible patches
    stats.variance_rebuilds = {
      #[cfg(feature = "trace_spans")]
      let _span = tracing::info_span!("compute_variance").entered();
      self
        .patches
        .par_iter_mut()
        .zip(visible.par_iter())
        .filter(|(patch, &seen)| seen && patch.is_dirty())
        .map(|(patch, _)| patch.compute_variance(heights))
        .count()
    };

    // Phase 3: Retessellate when needed
    let cam_pos = camera.position();
    let view_radius = camera.view_radius();
    if self.needs_retessellation(&visible, cam_pos, view_radius, worker, stats.variance_rebuilds) {
      #[cfg(feature = "trace_spans")]
      let _span = tracing::info_span!("retessellate").entered();

      let binding = PoolBinding {
        pass: self.pass,
        worker,
      };
      pool.reset();
      for patch in &mut self.patches {
        patch.attach_to_pool(pool, binding);
      }
      self.link_neighbors(pool);

      for (patch, _) in self.patches.iter_mut().zip(&visible).filter(|(_, &seen)| seen) {
        let result = patch.tessellate_with(pool, binding, heights, cam_pos, view_radius);
        stats.tessellated_patches += 1;
        if !result.completed() {
          stats.exhausted_patches += 1;
        }
      }

      for patch in &mut self.patches {
        patch.generate_indices(pool);
      }

      self.last_cam_pos = Some(cam_pos);
      self.last_view_radius = view_radius;
      self.last_worker = Some(worker);
      self.tessellated_visible.copy_from_slice(&visible);
      self.last_exhausted_patches = stats.exhausted_patches;
      self.force_retessellate = false;
      stats.retessellated = true;
    } else {
      stats.exhausted_patches = self.last_exhausted_patches;
    }

    stats.triangles = self
      .patches
      .iter()
      .zip(&visible)
      .filter(|(_, &seen)| seen)
      .map(|(patch, _)| patch.tri_count())
      .sum();
    stats.nodes_used = pool.used();

    if stats.retessellated && stats.pool_exhausted() {
      tracing::warn!(
        pass = ?self.pass,
        exhausted = stats.exhausted_patches,
        capacity = pool.capacity(),
        "triangle node pool exhausted, mesh is coarser than requested"
      );
    }
    if stats.retessellated {
      tracing::debug!(
        pass = ?self.pass,
        frame,
        visible = stats.visible_patches,
        triangles = stats.triangles,
        nodes = stats.nodes_used,
        variance_rebuilds = stats.variance_rebuilds,
        "retessellated terrain"
      );
    }

    stats
  }

  fn needs_retessellation(
    &self,
    visible: &[bool],
    cam_pos: Vec3,
    view_radius: f32,
    worker: usize,
    variance_rebuilds: usize,
  ) -> bool {
    let Some(last_cam_pos) = self.last_cam_pos else {
      return true;
    };

    self.force_retessellate
      || self.retessellate.always
      || variance_rebuilds > 0
      || self.last_worker != Some(worker)
      || view_radius != self.last_view_radius
      || cam_pos.distance(last_cam_pos) > self.retessellate.camera_distance
      || visible
        .iter()
        .zip(&self.tessellated_visible)
        .any(|(&now, &before)| now && !before)
  }

  /// Link base triangles across shared patch edges.
  ///
  /// ```text
  ///             north.base_right
  ///          ┌─────────────────┐
  ///  west.   │ base_left    ╱  │  east.
  ///  base_   │           ╱     │  base_
  ///  right   │        ╱        │  left
  ///          │     ╱ base_right│
  ///          └─────────────────┘
  ///             south.base_left
  /// ```
  fn link_neighbors(&self, pool: &mut TriNodePool) {
    for pz in 0..self.patches_z {
      for px in 0..self.patches_x {
        let patch = &self.patches[(pz * self.patches_x + px) as usize];
        let neighbor = |dx: i32, dz: i32| self.patch(px + dx, pz + dz);

        if let Some(left) = patch.base_left() {
          pool[left].left_neighbor = neighbor(-1, 0).and_then(Patch::base_right);
          pool[left].right_neighbor = neighbor(0, -1).and_then(Patch::base_right);
        }
        if let Some(right) = patch.base_right() {
          pool[right].left_neighbor = neighbor(1, 0).and_then(Patch::base_left);
          pool[right].right_neighbor = neighbor(0, 1).and_then(Patch::base_left);
        }
      }
    }
  }

  /// Forward a heightmap change in world rectangle `rect` (inclusive) to
  /// every overlapping patch. Returns the number of patches touched.
  pub fn update_height_map<H: HeightMap + ?Sized>(&mut self, heights: &H, rect: Rect) -> usize {
    let mut touched = 0;
    for patch in &mut self.patches {
      let origin = patch.origin();
      let extent = Rect::new(origin.x, origin.y, origin.x + PATCH_SIZE, origin.y + PATCH_SIZE);
      let overlap = rect.intersect(&extent);
      if overlap.is_empty() {
        continue;
      }
      patch.update_height_map(heights, Some(overlap.to_local(origin)));
      touched += 1;
    }
    touched
  }

  /// Leaf triangles of every patch, as `[left, right, apex]` world grid
  /// corners. `pool` must be the pool of the last update.
  pub fn leaf_triangles(&self, pool: &TriNodePool) -> Vec<[IVec2; 3]> {
    self
      .patches
      .iter()
      .flat_map(|patch| patch.leaf_triangles(pool))
      .collect()
  }
}

#[cfg(test)]
#[path = "mesh_test.rs"]
mod mesh_test;
