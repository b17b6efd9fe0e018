//! Flythrough scenario parsing.

use anyhow::{Context, Result};
use roam_terrain::{LodConfig, PoolConfig, RetessellateConfig, TerrainConfig, PATCH_SIZE};
use serde::Deserialize;
use std::path::Path;

/// Root scenario configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// Number of frames to simulate.
	#[serde(default = "default_frames")]
	pub frames: u32,
	/// Worker contexts per pass (0 = one per rayon thread).
	#[serde(default)]
	pub workers: usize,
	#[serde(default)]
	pub map: MapConfig,
	#[serde(default)]
	pub camera: CameraConfig,
	#[serde(default)]
	pub pool: PoolSection,
	#[serde(default)]
	pub lod: LodSection,
}

/// Procedural heightfield.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
	/// Width in quads, a multiple of the patch size.
	pub width: i32,
	/// Depth in quads, a multiple of the patch size.
	pub depth: i32,
	/// Peak hill height.
	pub amplitude: f32,
	/// Horizontal feature scale (world units per hill).
	pub wavelength: f32,
	/// Heights are shifted down by this much; crossings of zero are shore
	/// lines.
	pub sea_level: f32,
}

impl Default for MapConfig {
	fn default() -> Self {
		Self {
			width: PATCH_SIZE * 8,
			depth: PATCH_SIZE * 8,
			amplitude: 80.0,
			wavelength: 180.0,
			sea_level: 20.0,
		}
	}
}

/// Straight-line camera path.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
	pub start: [f32; 3],
	/// Movement per frame.
	pub velocity: [f32; 3],
	pub view_radius: f32,
	/// View radius of the shadow camera.
	pub shadow_view_radius: f32,
}

impl Default for CameraConfig {
	fn default() -> Self {
		Self {
			start: [64.0, 120.0, 64.0],
			velocity: [12.0, 0.0, 9.0],
			view_radius: 300.0,
			shadow_view_radius: 1200.0,
		}
	}
}

/// Node pool sizing.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSection {
	pub capacity: usize,
	/// Double the pools after a frame that ran out of nodes.
	pub grow: bool,
	pub max_capacity: usize,
}

impl Default for PoolSection {
	fn default() -> Self {
		let defaults = TerrainConfig::default();
		Self {
			capacity: PoolConfig::DEFAULT.capacity,
			grow: defaults.grow_pools_on_exhaustion,
			max_capacity: defaults.max_pool_capacity,
		}
	}
}

/// Error metric and retessellation policy.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LodSection {
	pub distance_scale: f32,
	pub variance_limit_scale: f32,
	pub min_variance_limit: f32,
	pub split_threshold: f32,
	pub shore_line_boost: bool,
	/// Camera travel that triggers a rebuild.
	pub retessellate_distance: f32,
	/// Rebuild every frame.
	pub always_retessellate: bool,
}

impl Default for LodSection {
	fn default() -> Self {
		let lod = LodConfig::DEFAULT;
		let retessellate = RetessellateConfig::DEFAULT;
		Self {
			distance_scale: lod.distance_scale,
			variance_limit_scale: lod.variance_limit_scale,
			min_variance_limit: lod.min_variance_limit,
			split_threshold: lod.split_threshold,
			shore_line_boost: lod.shore_line_boost,
			retessellate_distance: retessellate.camera_distance,
			always_retessellate: retessellate.always,
		}
	}
}

fn default_frames() -> u32 {
	240
}

impl Default for Config {
	fn default() -> Self {
		Self {
			frames: default_frames(),
			workers: 0,
			map: MapConfig::default(),
			camera: CameraConfig::default(),
			pool: PoolSection::default(),
			lod: LodSection::default(),
		}
	}
}

impl Config {
	/// Load a scenario from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
		Self::parse(&content).with_context(|| format!("Invalid scenario: {}", path.display()))
	}

	/// Parse and validate a scenario.
	pub fn parse(content: &str) -> Result<Self> {
		let config: Config = toml::from_str(content).context("Failed to parse scenario TOML")?;

		if config.frames == 0 {
			anyhow::bail!("frames must be at least 1");
		}
		if !(config.map.wavelength > 0.0) {
			anyhow::bail!("map.wavelength must be positive, got {}", config.map.wavelength);
		}
		if !(config.camera.view_radius > 0.0 && config.camera.shadow_view_radius > 0.0) {
			anyhow::bail!("camera view radii must be positive");
		}

		// Map size is checked when the terrain is built
		config
			.terrain_config()
			.validate()
			.context("Invalid terrain settings")?;

		Ok(config)
	}

	/// Terrain configuration for this scenario.
	pub fn terrain_config(&self) -> TerrainConfig {
		TerrainConfig {
			lod: LodConfig {
				distance_scale: self.lod.distance_scale,
				variance_limit_scale: self.lod.variance_limit_scale,
				min_variance_limit: self.lod.min_variance_limit,
				split_threshold: self.lod.split_threshold,
				shore_line_boost: self.lod.shore_line_boost,
			},
			pool: PoolConfig {
				capacity: self.pool.capacity,
			},
			retessellate: RetessellateConfig {
				camera_distance: self.lod.retessellate_distance,
				always: self.lod.always_retessellate,
			},
			grow_pools_on_exhaustion: self.pool.grow,
			max_pool_capacity: self.pool.max_capacity,
			workers: self.workers,
		}
	}
}
