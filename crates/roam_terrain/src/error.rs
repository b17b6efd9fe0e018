//! Configuration and construction errors.
//!
//! Pool exhaustion is not an error: it is an expected runtime
//! condition reported through `bool` results and `TessellationStats`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
  /// Pools hand out node pairs, so capacity must be a non-zero even number.
  #[error("node pool capacity must be an even number >= 2, got {0}")]
  InvalidPoolCapacity(usize),

  /// A pool registry needs at least one worker.
  #[error("pool registry needs at least one worker")]
  NoWorkers,

  #[error("heightmap is empty: {width}x{depth}")]
  EmptyMap { width: i32, depth: i32 },

  #[error("heightmap size {width}x{depth} is not a multiple of the patch size {patch_size}")]
  UnalignedMap {
    width: i32,
    depth: i32,
    patch_size: i32,
  },

  #[error("invalid LOD configuration: {0}")]
  InvalidLodConfig(&'static str),
}
