//! RoamTerrain - heightmap, both pass meshes and their node pools.
//!
//! The per-frame entry point. Each pass takes the calling worker's pool of
//! its own pass kind, so [`RoamTerrain::update_all`] can run the normal and
//! shadow passes side by side without sharing anything mutable.

use glam::IVec2;
use web_time::Instant;

use crate::camera::ViewCamera;
use crate::config::TerrainConfig;
use crate::error::TerrainError;
use crate::heightmap::HeightMap;
use crate::mesh::{RoamMesh, TessellationStats};
use crate::metrics::TerrainMetrics;
use crate::tritree::{current_worker, PoolRegistry, TriNodePool};
use crate::types::{PassKind, Rect};

pub struct RoamTerrain<H: HeightMap> {
  heights: H,
  config: TerrainConfig,
  /// Indexed by `PassKind::index()`.
  meshes: [RoamMesh; 2],
  pools: PoolRegistry,
  metrics: TerrainMetrics,
  pool_exhaustions: u64,
}

impl<H: HeightMap> RoamTerrain<H> {
  pub fn new(heights: H, config: TerrainConfig) -> Result<Self, TerrainError> {
    config.validate()?;

    let workers = config.worker_count();
    let pools = PoolRegistry::new(workers, config.pool)?;
    let meshes = [
      RoamMesh::new(&heights, PassKind::Normal, &config)?,
      RoamMesh::new(&heights, PassKind::Shadow, &config)?,
    ];

    tracing::info!(
      width = heights.width(),
      depth = heights.depth(),
      workers,
      pool_capacity = config.pool.capacity,
      "created roam terrain"
    );

    Ok(Self {
      heights,
      config,
      meshes,
      pools,
      metrics: TerrainMetrics::new(),
      pool_exhaustions: 0,
    })
  }

  #[inline]
  pub fn heights(&self) -> &H {
    &self.heights
  }

  #[inline]
  pub fn config(&self) -> &TerrainConfig {
    &self.config
  }

  #[inline]
  pub fn mesh(&self, pass: PassKind) -> &RoamMesh {
    &self.meshes[pass.index()]
  }

  #[inline]
  pub fn pools(&self) -> &PoolRegistry {
    &self.pools
  }

  #[inline]
  pub fn metrics(&self) -> &TerrainMetrics {
    &self.metrics
  }

  /// Frames (either pass) that ran out of pool nodes.
  #[inline]
  pub fn pool_exhaustions(&self) -> u64 {
    self.pool_exhaustions
  }

  /// Pool holding the current triangulation of `pass`.
  pub fn current_pool(&self, pass: PassKind) -> Option<&TriNodePool> {
    let worker = self.mesh(pass).last_worker()?;
    self.pools.pool(pass, worker)
  }

  /// Leaf triangles of `pass` as `[left, right, apex]` grid corners.
  pub fn leaf_triangles(&self, pass: PassKind) -> Vec<[IVec2; 3]> {
    match self.current_pool(pass) {
      Some(pool) => self.mesh(pass).leaf_triangles(pool),
      None => Vec::new(),
    }
  }

  /// Run one frame of `pass` on the calling worker's pool.
  pub fn update<C>(&mut self, pass: PassKind, camera: &C, frame: u32) -> TessellationStats
  where
    H: Sync,
    C: ViewCamera + ?Sized,
  {
    let worker = self.pools.worker_slot();
    let pools = self.pools.pools_mut(pass);
    let (stats, timing_us) = run_pass(
      &mut self.meshes[pass.index()],
      pools,
      worker,
      &self.heights,
      camera,
      frame,
    );

    self.finish_pass(pass, &stats, timing_us);
    stats
  }

  /// Run the normal and shadow passes concurrently.
  ///
  /// Returns `[normal, shadow]` stats.
  pub fn update_all<N, S>(&mut self, normal_cam: &N, shadow_cam: &S, frame: u32) -> [TessellationStats; 2]
  where
    H: Sync,
    N: ViewCamera + Sync + ?Sized,
    S: ViewCamera + Sync + ?Sized,
  {
    #[cfg(feature = "trace_spans")]
    let _span = tracing::info_span!("roam_terrain::update_all", frame).entered();

    let heights = &self.heights;
    let [normal_mesh, shadow_mesh] = &mut self.meshes;
    let (normal_pools, shadow_pools) = self.pools.split_passes_mut();

    let ((normal, normal_us), (shadow, shadow_us)) = rayon::join(
      || {
        let worker = current_worker() % normal_pools.len();
        run_pass(normal_mesh, normal_pools, worker, heights, normal_cam, frame)
      },
      || {
        let worker = current_worker() % shadow_pools.len();
        run_pass(shadow_mesh, shadow_pools, worker, heights, shadow_cam, frame)
      },
    );

    self.finish_pass(PassKind::Normal, &normal, normal_us);
    self.finish_pass(PassKind::Shadow, &shadow, shadow_us);
    [normal, shadow]
  }

  /// Mutate the heightmap, then mark every patch overlapping `rect`
  /// (inclusive world corners) dirty in both passes.
  ///
  /// Returns the number of patches touched per pass.
  pub fn edit_heights(&mut self, rect: Rect, edit: impl FnOnce(&mut H)) -> usize {
    edit(&mut self.heights);

    let mut touched = 0;
    for mesh in &mut self.meshes {
      touched = mesh.update_height_map(&self.heights, rect);
    }
    tracing::debug!(?rect, touched, "heightmap edited");
    touched
  }

  fn finish_pass(&mut self, pass: PassKind, stats: &TessellationStats, timing_us: u64) {
    self.metrics.record_update(pass, stats, timing_us);

    if !stats.pool_exhausted() {
      return;
    }
    self.pool_exhaustions += 1;

    if self.config.grow_pools_on_exhaustion {
      self.grow_pools(pass);
    }
  }

  /// Double the pool capacity of `pass` (up to the configured maximum).
  /// Takes effect on the next frame.
  fn grow_pools(&mut self, pass: PassKind) {
    let capacity = self.pools.capacity(pass);
    let max = self.config.max_pool_capacity;
    if capacity >= max {
      return;
    }

    let grown = capacity.saturating_mul(2).min(max);
    self.meshes[pass.index()].release_pool();
    match self.pools.init_pools(pass, grown) {
      Ok(()) => tracing::info!(?pass, from = capacity, to = grown, "grew triangle node pools"),
      Err(err) => tracing::warn!(?pass, %err, "failed to grow triangle node pools"),
    }
  }
}

fn run_pass<H, C>(
  mesh: &mut RoamMesh,
  pools: &mut [TriNodePool],
  worker: usize,
  heights: &H,
  camera: &C,
  frame: u32,
) -> (TessellationStats, u64)
where
  H: HeightMap + Sync + ?Sized,
  C: ViewCamera + ?Sized,
{
  let start = Instant::now();
  let stats = mesh.update(heights, camera, frame, &mut pools[worker], worker);
  let timing_us = start.elapsed().as_micros() as u64;
  (stats, timing_us)
}

#[cfg(test)]
#[path = "terrain_test.rs"]
mod terrain_test;
