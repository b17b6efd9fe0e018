//! Tessellation configuration: LOD falloff, pool sizing and retessellation
//! policy.

use crate::constants::{DEBUG_POOL_SIZE, NEW_POOL_SIZE};
use crate::error::TerrainError;

/// Error-metric parameters for the split decision.
///
/// For a leaf triangle at variance-tree address `a` whose hypotenuse spans
/// `size` grid units:
///
/// ```text
/// factor = 1 / max(1, distance * distance_scale / view_radius)
/// limit  = max(min_variance_limit, factor * variance_limit_scale)
/// error  = min(variance[a], limit) * PATCH_SIZE * size * factor
/// split if error > split_threshold
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodConfig {
  /// Camera-distance falloff; increase to reduce detail with distance.
  pub distance_scale: f32,

  /// Regulates how deeply areas tessellate by clamping variances.
  /// Without a clamp huge cliffs would always tessellate fully regardless of
  /// camera distance.
  pub variance_limit_scale: f32,

  /// Lower bound of the variance clamp.
  pub min_variance_limit: f32,

  /// Error above which a leaf is split.
  pub split_threshold: f32,

  /// Boost variance where the surface crosses height zero (shore lines).
  pub shore_line_boost: bool,
}

impl LodConfig {
  pub const DEFAULT: Self = Self {
    distance_scale: 300.0,
    variance_limit_scale: 200.0,
    min_variance_limit: 2.0,
    split_threshold: 1.0,
    shore_line_boost: true,
  };

  /// Camera-distance LOD factor in `(0, 1]`; 1 = full detail.
  ///
  /// A non-positive view radius disables refinement (factor 0).
  #[inline]
  pub fn cam_dist_lod_factor(&self, distance: f32, view_radius: f32) -> f32 {
    let scaled = if view_radius > 0.0 {
      distance * self.distance_scale / view_radius
    } else {
      f32::INFINITY
    };
    1.0 / scaled.max(1.0)
  }

  /// Variance clamp for a given LOD factor.
  #[inline]
  pub fn variance_limit(&self, lod_factor: f32) -> f32 {
    self.min_variance_limit.max(lod_factor * self.variance_limit_scale)
  }

  pub fn validate(&self) -> Result<(), TerrainError> {
    if !(self.distance_scale > 0.0) {
      return Err(TerrainError::InvalidLodConfig("distance_scale must be positive"));
    }
    if !(self.variance_limit_scale > 0.0) {
      return Err(TerrainError::InvalidLodConfig("variance_limit_scale must be positive"));
    }
    if !(self.min_variance_limit >= 0.0) {
      return Err(TerrainError::InvalidLodConfig("min_variance_limit must be non-negative"));
    }
    if !(self.split_threshold > 0.0) {
      return Err(TerrainError::InvalidLodConfig("split_threshold must be positive"));
    }
    Ok(())
  }
}

impl Default for LodConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Node pool sizing (per worker, per pass kind).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
  /// Node slots per pool. Must be even.
  pub capacity: usize,
}

impl PoolConfig {
  /// Baseline for most maps.
  pub const DEFAULT: Self = Self {
    capacity: NEW_POOL_SIZE,
  };

  /// Tiny pool that exhausts almost immediately (debugging).
  pub const DEBUG_EXHAUSTION: Self = Self {
    capacity: DEBUG_POOL_SIZE,
  };

  pub fn validate(&self) -> Result<(), TerrainError> {
    validate_capacity(self.capacity)
  }
}

impl Default for PoolConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

pub(crate) fn validate_capacity(capacity: usize) -> Result<(), TerrainError> {
  if capacity < 2 || capacity % 2 != 0 || capacity > u32::MAX as usize - 1 {
    return Err(TerrainError::InvalidPoolCapacity(capacity));
  }
  Ok(())
}

/// When a mesh throws away its triangulation and rebuilds it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetessellateConfig {
  /// Camera travel (world units) that triggers a rebuild.
  pub camera_distance: f32,
  /// Rebuild every frame regardless of camera movement.
  pub always: bool,
}

impl RetessellateConfig {
  pub const DEFAULT: Self = Self {
    camera_distance: 500.0,
    always: false,
  };

  /// Rebuild every frame.
  pub const EVERY_FRAME: Self = Self {
    camera_distance: 0.0,
    always: true,
  };
}

impl Default for RetessellateConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Top-level terrain configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainConfig {
  pub lod: LodConfig,
  pub pool: PoolConfig,
  pub retessellate: RetessellateConfig,
  /// Double the pool capacity of a pass for the next frame after it ran out
  /// of nodes. Pools are never resized mid-frame.
  pub grow_pools_on_exhaustion: bool,
  /// Upper bound for pool growth.
  pub max_pool_capacity: usize,
  /// Worker contexts per pass (0 = rayon's thread count).
  pub workers: usize,
}

impl TerrainConfig {
  pub fn validate(&self) -> Result<(), TerrainError> {
    self.lod.validate()?;
    self.pool.validate()?;
    if self.grow_pools_on_exhaustion {
      validate_capacity(self.max_pool_capacity)?;
    }
    Ok(())
  }

  /// Resolved worker count.
  pub fn worker_count(&self) -> usize {
    if self.workers == 0 {
      rayon::current_num_threads().max(1)
    } else {
      self.workers
    }
  }
}

impl Default for TerrainConfig {
  fn default() -> Self {
    Self {
      lod: LodConfig::DEFAULT,
      pool: PoolConfig::DEFAULT,
      retessellate: RetessellateConfig::DEFAULT,
      grow_pools_on_exhaustion: false,
      max_pool_capacity: NEW_POOL_SIZE * 8,
      workers: 0,
    }
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
