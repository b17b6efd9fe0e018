//! ROAM terrain flythrough.
//!
//! Flies a camera in a straight line over a procedural heightfield, runs the
//! normal and shadow passes every frame and reports tessellation statistics.
//! No rendering; this is a harness for tuning LOD and pool settings.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use roam_terrain::{
	CameraType, GridHeightMap, PassKind, RoamTerrain, TessellationStats, ViewCamera,
};
use std::path::PathBuf;

use config::{Config, MapConfig};

/// ROAM terrain tessellation flythrough.
#[derive(Parser, Debug)]
#[command(name = "roam_flythrough")]
#[command(about = "Flies over a heightfield and reports ROAM tessellation statistics")]
struct Args {
	/// Path to scenario TOML file (built-in scenario if omitted).
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Override the number of frames.
	#[arg(short, long)]
	frames: Option<u32>,

	/// Print statistics for every frame, not only rebuilds.
	#[arg(short, long)]
	verbose: bool,
}

/// Camera that sees everything within its view radius.
struct FlyCamera {
	position: Vec3,
	view_radius: f32,
	camera_type: CameraType,
}

impl ViewCamera for FlyCamera {
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
		let closest = self.position.clamp(min, max);
		closest.distance(self.position) <= self.view_radius
	}
}

fn main() -> Result<()> {
	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => {
			println!("Loading scenario from: {}", path.display());
			Config::load(path)?
		}
		None => Config::default(),
	};
	if let Some(frames) = args.frames {
		config.frames = frames.max(1);
	}

	let heights = build_heightmap(&config.map);
	let mut terrain = RoamTerrain::new(heights, config.terrain_config())
		.context("Failed to create terrain")?;

	println!(
		"Terrain {}x{} ({} patches), {} workers, pool capacity {}",
		config.map.width,
		config.map.depth,
		terrain.mesh(PassKind::Normal).patches().len(),
		terrain.pools().worker_count(),
		config.pool.capacity
	);

	let start = Vec3::from_array(config.camera.start);
	let velocity = Vec3::from_array(config.camera.velocity);
	let center = Vec3::new(config.map.width as f32 * 0.5, 0.0, config.map.depth as f32 * 0.5);

	let mut totals = [Totals::default(), Totals::default()];
	for frame in 0..config.frames {
		let player = FlyCamera {
			position: start + velocity * frame as f32,
			view_radius: config.camera.view_radius,
			camera_type: CameraType::Player,
		};
		let sun = FlyCamera {
			position: center + Vec3::Y * config.camera.shadow_view_radius * 0.5,
			view_radius: config.camera.shadow_view_radius,
			camera_type: CameraType::Shadow,
		};

		let stats = terrain.update_all(&player, &sun, frame);

		for (pass, stats) in PassKind::ALL.into_iter().zip(&stats) {
			totals[pass.index()].add(stats);
			if args.verbose || stats.retessellated {
				print_frame(frame, pass, stats);
			}
		}
	}

	println!("\nSummary over {} frames:", config.frames);
	for pass in PassKind::ALL {
		let t = &totals[pass.index()];
		println!(
			"  {:?}: {} rebuilds, {} variance rebuilds, avg {:.0} / peak {} triangles, peak {} nodes (capacity {})",
			pass,
			t.retessellations,
			t.variance_rebuilds,
			t.triangles as f64 / config.frames as f64,
			t.peak_triangles,
			t.peak_nodes,
			terrain.pools().capacity(pass)
		);
		#[cfg(feature = "metrics")]
		println!(
			"         avg update {:.1} us",
			terrain.metrics().avg_update_timing_us(pass)
		);
	}
	println!("  Pool exhaustions: {}", terrain.pool_exhaustions());

	Ok(())
}

#[derive(Default)]
struct Totals {
	retessellations: usize,
	variance_rebuilds: usize,
	triangles: usize,
	peak_triangles: usize,
	peak_nodes: usize,
}

impl Totals {
	fn add(&mut self, stats: &TessellationStats) {
		self.retessellations += stats.retessellated as usize;
		self.variance_rebuilds += stats.variance_rebuilds;
		self.triangles += stats.triangles;
		self.peak_triangles = self.peak_triangles.max(stats.triangles);
		self.peak_nodes = self.peak_nodes.max(stats.nodes_used);
	}
}

fn print_frame(frame: u32, pass: PassKind, stats: &TessellationStats) {
	println!(
		"[{:>5}] {:?} visible {:>3}  tessellated {:>3}  triangles {:>7}  nodes {:>8}{}",
		frame,
		pass,
		stats.visible_patches,
		stats.tessellated_patches,
		stats.triangles,
		stats.nodes_used,
		if stats.pool_exhausted() {
			format!("  EXHAUSTED ({} patches)", stats.exhausted_patches)
		} else {
			String::new()
		}
	);
}

/// Layered sine hills shifted down by the sea level.
fn build_heightmap(map: &MapConfig) -> GridHeightMap {
	let k = std::f32::consts::TAU / map.wavelength;
	GridHeightMap::from_fn(map.width, map.depth, |x, z| {
		let (fx, fz) = (x as f32 * k, z as f32 * k);
		let base = (fx.sin() * fz.cos() + 1.0) * 0.5;
		let detail = 0.25 * (fx * 3.7 + fz * 2.3).sin() * (fz * 4.1 - fx * 1.3).cos();
		map.amplitude * (base + detail) - map.sea_level
	})
}
