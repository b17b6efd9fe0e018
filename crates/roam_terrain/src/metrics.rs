//! Engine-agnostic tessellation statistics.
//!
//! Feature-gated and runtime-toggled: without the `metrics` feature every
//! recording call is a no-op.
//!
//! # Usage
//!
//! ```ignore
//! use roam_terrain::metrics::{TerrainMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! // Inspect after frames ran:
//! let avg = terrain.metrics().avg_update_timing_us(PassKind::Normal);
//! ```
//!
//! Pool exhaustion counts are not metrics: they are always tracked by
//! `RoamTerrain` so pool capacity can be tuned in any build.

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

use crate::mesh::TessellationStats;
use crate::types::PassKind;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
  #[cfg(feature = "metrics")]
  {
    COLLECT_METRICS.load(Ordering::Relaxed)
  }
  #[cfg(not(feature = "metrics"))]
  {
    false
  }
}

/// Fixed-size history, oldest values evicted first.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  pub fn push(&mut self, value: T) {
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
  }

  /// Oldest to newest.
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    self.buffer.iter()
  }

  pub fn last(&self) -> Option<&T> {
    self.buffer.back()
  }
}

impl RollingWindow<u64> {
  pub fn sum(&self) -> u64 {
    self.buffer.iter().sum()
  }

  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.sum() as f64 / self.buffer.len() as f64
    }
  }

  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = self.buffer.iter().min()?;
    let max = self.buffer.iter().max()?;
    Some((*min, *max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(128) // ~2 seconds at 60fps
  }
}

/// Per-pass statistics.
#[derive(Debug, Clone, Default)]
pub struct PassMetrics {
  /// Update timings in microseconds.
  pub update_timings: RollingWindow<u64>,
  /// Triangles drawn on the last frame.
  pub last_triangles: usize,
  /// Pool slots used on the last frame.
  pub last_nodes_used: usize,
  /// Highest pool usage seen.
  pub peak_nodes_used: usize,
  /// Frames that rebuilt the triangulation.
  pub retessellations: u64,
  /// Variance trees rebuilt (per patch).
  pub variance_rebuilds: u64,
}

/// Terrain-wide statistics, one [`PassMetrics`] per pass kind.
#[derive(Debug, Clone, Default)]
pub struct TerrainMetrics {
  passes: [PassMetrics; 2],
}

impl TerrainMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pass(&self, pass: PassKind) -> &PassMetrics {
    &self.passes[pass.index()]
  }

  /// Record one frame of `pass`.
  pub fn record_update(&mut self, pass: PassKind, stats: &TessellationStats, timing_us: u64) {
    if !is_enabled() {
      return;
    }

    let metrics = &mut self.passes[pass.index()];
    metrics.update_timings.push(timing_us);
    metrics.last_triangles = stats.triangles;
    metrics.last_nodes_used = stats.nodes_used;
    metrics.peak_nodes_used = metrics.peak_nodes_used.max(stats.nodes_used);
    metrics.variance_rebuilds += stats.variance_rebuilds as u64;
    if stats.retessellated {
      metrics.retessellations += 1;
    }
  }

  /// Average update time of `pass` in microseconds.
  pub fn avg_update_timing_us(&self, pass: PassKind) -> f64 {
    self.pass(pass).update_timings.average()
  }

  /// Reset per-frame data; cumulative counters survive.
  pub fn reset(&mut self) {
    for metrics in &mut self.passes {
      metrics.update_timings.clear();
      metrics.last_triangles = 0;
      metrics.last_nodes_used = 0;
    }
  }
}
