use super::*;

// =========================================================================
// LodConfig Tests - distance falloff
// =========================================================================

/// Close to the camera the factor saturates at full detail.
#[test]
fn test_lod_factor_saturates_at_one() {
  let lod = LodConfig::default();
  assert_eq!(lod.cam_dist_lod_factor(0.0, 300.0), 1.0);
  assert_eq!(lod.cam_dist_lod_factor(1.0, 300.0), 1.0, "d * 300 / 300 = 1");
}

/// Beyond saturation the factor falls off as 1 / distance.
#[test]
fn test_lod_factor_falls_off_with_distance() {
  let lod = LodConfig::default();

  let near = lod.cam_dist_lod_factor(10.0, 300.0);
  let far = lod.cam_dist_lod_factor(100.0, 300.0);

  assert_eq!(near, 0.1);
  assert_eq!(far, 0.01);
  assert!(far < near, "Farther patches get less detail");
}

/// A larger view radius keeps more detail at the same distance.
#[test]
fn test_view_radius_scales_factor() {
  let lod = LodConfig::default();
  let small = lod.cam_dist_lod_factor(100.0, 300.0);
  let large = lod.cam_dist_lod_factor(100.0, 3000.0);
  assert!(large > small);
}

#[test]
fn test_non_positive_view_radius_disables_detail() {
  let lod = LodConfig::default();
  assert_eq!(lod.cam_dist_lod_factor(0.0, 0.0), 0.0);
  assert_eq!(lod.cam_dist_lod_factor(50.0, -1.0), 0.0);
}

/// The variance clamp never drops below min_variance_limit.
#[test]
fn test_variance_limit_floor() {
  let lod = LodConfig::default();
  assert_eq!(lod.variance_limit(0.001), 2.0, "200 * 0.001 < 2");
  assert_eq!(lod.variance_limit(1.0), 200.0);
}

#[test]
fn test_lod_validation() {
  assert!(LodConfig::default().validate().is_ok());

  let mut bad = LodConfig::default();
  bad.split_threshold = 0.0;
  assert!(matches!(bad.validate(), Err(TerrainError::InvalidLodConfig(_))));

  let mut nan = LodConfig::default();
  nan.distance_scale = f32::NAN;
  assert!(nan.validate().is_err(), "NaN must not pass validation");
}

// =========================================================================
// PoolConfig / TerrainConfig Tests
// =========================================================================

#[test]
fn test_pool_presets() {
  assert_eq!(PoolConfig::default().capacity, 1 << 20);
  assert_eq!(PoolConfig::DEBUG_EXHAUSTION.capacity, 4);
  assert!(PoolConfig::DEFAULT.validate().is_ok());
  assert!(PoolConfig::DEBUG_EXHAUSTION.validate().is_ok());
}

#[test]
fn test_pool_capacity_must_be_even_and_non_zero() {
  for capacity in [0, 1, 3, 1025] {
    assert_eq!(
      PoolConfig { capacity }.validate(),
      Err(TerrainError::InvalidPoolCapacity(capacity)),
      "capacity {} should be rejected",
      capacity
    );
  }
  assert!(PoolConfig { capacity: 2 }.validate().is_ok());
}

#[test]
fn test_retessellate_presets() {
  assert_eq!(RetessellateConfig::default().camera_distance, 500.0);
  assert!(!RetessellateConfig::default().always);
  assert!(RetessellateConfig::EVERY_FRAME.always);
}

#[test]
fn test_terrain_config_worker_count() {
  let mut config = TerrainConfig::default();
  assert!(config.worker_count() >= 1, "0 resolves to rayon's thread count");

  config.workers = 3;
  assert_eq!(config.worker_count(), 3);
}

#[test]
fn test_terrain_config_validates_growth_cap() {
  let mut config = TerrainConfig::default();
  assert!(config.validate().is_ok());

  config.grow_pools_on_exhaustion = true;
  config.max_pool_capacity = 7;
  assert_eq!(config.validate(), Err(TerrainError::InvalidPoolCapacity(7)));
}
